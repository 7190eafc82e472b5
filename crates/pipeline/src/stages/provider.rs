use async_trait::async_trait;
use conductor_domain::config::ModelPricing;
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;
use conductor_domain::run::CostInfo;
use conductor_domain::tool::ToolDefinition;
use conductor_domain::trace::TraceEvent;
use conductor_providers::traits::ChatRequest;
use conductor_tools::policy::ToolCallGovernor;

use crate::stage::{keys, Stage, StageContext};

/// Conversation-state metadata key the governor's total tool-call count is
/// threaded through under, so `max_total_tool_calls` (§4.7) is enforced
/// across the whole run rather than resetting every turn.
const TOTAL_TOOL_CALLS_KEY: &str = "total_tool_calls";

/// Maximum number of tool-call round trips before a turn is force-stopped.
/// A model that never stops calling tools would otherwise hang a run
/// forever.
const MAX_TOOL_LOOPS: usize = 25;

/// Drives one turn's request/response cycle against the run's provider,
/// including the tool-call loop (§4.1 step 6, §4.7): dispatch every call
/// the model makes, feed results back as tool-role turns, and repeat
/// until the model stops calling tools or the run's [`ToolCallGovernor`]
/// refuses the next one.
pub struct ProviderStage;

fn allowed_tool_defs(element: &StreamElement, ctx: &StageContext) -> Vec<ToolDefinition> {
    let allowed: Vec<String> = element
        .metadata
        .get(keys::ALLOWED_TOOLS)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    if allowed.is_empty() {
        return Vec::new();
    }
    ctx.services
        .tools
        .definitions()
        .into_iter()
        .filter(|d| allowed.contains(&d.name))
        .collect()
}

fn estimate_turn_cost(model: &str, pricing: &std::collections::HashMap<String, ModelPricing>, usage: &conductor_domain::stream::Usage) -> CostInfo {
    let total_cost = pricing
        .get(model)
        .map(|p| p.estimate_cost(usage.prompt_tokens, usage.completion_tokens))
        .unwrap_or(0.0);
    CostInfo {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        total_cost,
    }
}

#[async_trait]
impl Stage for ProviderStage {
    fn name(&self) -> &str {
        "provider"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;

        let provider = ctx.services.providers.get(&ctx.run.provider_id).ok_or_else(|| {
            Error::Config(format!("provider \"{}\" is not registered", ctx.run.provider_id))
        })?;

        let raw_state = element.metadata.get(keys::CONVERSATION_STATE).cloned().ok_or_else(|| {
            Error::Config("provider stage requires metadata[conversation_state] to be populated".into())
        })?;
        let mut state: ConversationState = serde_json::from_value(raw_state)?;

        let system_prompt = element
            .metadata
            .get(keys::PROMPT)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let tool_defs = allowed_tool_defs(&element, ctx);
        let prior_total = state
            .metadata
            .get(TOTAL_TOOL_CALLS_KEY)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        let mut governor = ToolCallGovernor::with_total(ctx.run.tool_policy.clone(), prior_total);
        governor.begin_turn();

        let mut total_cost = CostInfo {
            input_tokens: 0,
            output_tokens: 0,
            total_cost: 0.0,
        };
        let mut tool_violations: Vec<String> = Vec::new();
        let mut turn_tool_calls: Vec<conductor_domain::message::ToolCall> = Vec::new();
        let mut final_message = None;

        for loop_index in 0..MAX_TOOL_LOOPS {
            ctx.check_cancelled()?;

            let mut request_messages = Vec::with_capacity(state.messages.len() + 1);
            if !system_prompt.is_empty() {
                request_messages.push(Message::system(system_prompt.clone()));
            }
            request_messages.extend(state.messages.iter().cloned());

            let request = ChatRequest {
                messages: request_messages,
                tools: tool_defs.clone(),
                tool_choice: ctx.run.tool_policy.tool_choice.clone(),
                ..ChatRequest::default()
            };

            let response = provider.predict(request).await?;

            if let Some(usage) = &response.usage {
                let model = if response.model.is_empty() { ctx.run.provider_id.as_str() } else { response.model.as_str() };
                let turn_cost = estimate_turn_cost(model, &ctx.services.pricing, usage);
                total_cost.input_tokens += turn_cost.input_tokens;
                total_cost.output_tokens += turn_cost.output_tokens;
                total_cost.total_cost += turn_cost.total_cost;
            }

            let mut assistant_message = Message::assistant(response.content.clone());
            if !response.tool_calls.is_empty() {
                assistant_message.tool_calls = Some(response.tool_calls.clone());
                turn_tool_calls.extend(response.tool_calls.iter().cloned());
            }
            state.append(assistant_message.clone());

            if loop_index == 0 {
                if let Err(violation) = governor.check_required(!response.tool_calls.is_empty()) {
                    tool_violations.push(violation.to_string());
                    TraceEvent::ToolCapExceeded {
                        run_id: ctx.run.run_id.clone(),
                        kind: violation.to_string(),
                    }
                    .emit();
                }
            }

            if response.tool_calls.is_empty() {
                final_message = Some(assistant_message);
                break;
            }

            let mut refused = false;
            for call in &response.tool_calls {
                TraceEvent::ToolCallDispatched {
                    run_id: ctx.run.run_id.clone(),
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                }
                .emit();

                if let Err(violation) = governor.authorize(&call.name) {
                    tool_violations.push(violation.to_string());
                    state.append(Message::tool_error(call.id.clone(), violation.to_string()));
                    TraceEvent::ToolCapExceeded {
                        run_id: ctx.run.run_id.clone(),
                        kind: violation.to_string(),
                    }
                    .emit();
                    refused = true;
                    continue;
                }
                governor.record_call();

                let started = std::time::Instant::now();
                match ctx.services.tools.execute(&call.name, call.arguments.clone()).await {
                    Ok(content) => {
                        state.append(Message::tool_result(call.id.clone(), content));
                        TraceEvent::ToolCallCompleted {
                            run_id: ctx.run.run_id.clone(),
                            call_id: call.id.clone(),
                            tool_name: call.name.clone(),
                            duration_ms: started.elapsed().as_millis() as u64,
                            is_error: false,
                        }
                        .emit();
                    }
                    Err(e) => {
                        state.append(Message::tool_error(call.id.clone(), e.to_string()));
                        TraceEvent::ToolCallCompleted {
                            run_id: ctx.run.run_id.clone(),
                            call_id: call.id.clone(),
                            tool_name: call.name.clone(),
                            duration_ms: started.elapsed().as_millis() as u64,
                            is_error: true,
                        }
                        .emit();
                    }
                }
            }

            if refused {
                final_message = Some(state.messages.last().cloned().unwrap_or_else(|| Message::assistant("")));
                break;
            }
        }

        let final_message = final_message.unwrap_or_else(|| {
            tool_violations.push("tool-call loop exceeded max iterations".into());
            state.messages.last().cloned().unwrap_or_else(|| Message::assistant(""))
        });

        state
            .metadata
            .insert(TOTAL_TOOL_CALLS_KEY.into(), serde_json::json!(governor.total_calls()));

        element.metadata.insert(
            keys::CONVERSATION_STATE.into(),
            serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
        );
        element.metadata.insert(
            keys::RESPONSE.into(),
            serde_json::to_value(&final_message).unwrap_or(serde_json::Value::Null),
        );
        element.metadata.insert(
            keys::COST.into(),
            serde_json::to_value(&total_cost).unwrap_or(serde_json::Value::Null),
        );
        element.metadata.insert(
            keys::TURN_TOOL_CALLS.into(),
            serde_json::to_value(&turn_tool_calls).unwrap_or(serde_json::Value::Null),
        );
        if !tool_violations.is_empty() {
            element.metadata.insert(
                keys::TOOL_VIOLATIONS.into(),
                serde_json::to_value(&tool_violations).unwrap_or(serde_json::Value::Null),
            );
        }
        element.message = Some(final_message);

        Ok(vec![element])
    }
}
