use async_trait::async_trait;
use conductor_assertions::evaluator::{evaluate, EvalContext, EvalInput};
use conductor_domain::assertion::{Assertion, AssertionScope, ValidationError};
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::Result;
use conductor_domain::message::{Message, ToolCall};

use crate::stage::{keys, Stage, StageContext};

/// Evaluates a turn's assertions against the response the provider stage
/// just produced (§4.1 step 7, §4.3). Conversation-scoped assertions run
/// once after the last turn, outside the pipeline — the executor, not
/// this stage, holds the full-conversation view needed for those.
pub struct ValidationStage;

#[async_trait]
impl Stage for ValidationStage {
    fn name(&self) -> &str {
        "validation"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;

        let assertions: Vec<Assertion> = element
            .metadata
            .get(keys::TURN_ASSERTIONS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        if assertions.is_empty() {
            return Ok(vec![element]);
        }

        let state: ConversationState = element
            .metadata
            .get(keys::CONVERSATION_STATE)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_else(|| ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now()));

        let turn_tool_calls: Vec<ToolCall> = element
            .metadata
            .get(keys::TURN_TOOL_CALLS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let turn_response: Option<Message> = element
            .metadata
            .get(keys::RESPONSE)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .or_else(|| element.message.clone());

        let eval_ctx = EvalContext {
            providers: &ctx.services.providers,
            default_judge_provider: ctx.services.default_judge_provider.as_deref(),
            validators: &ctx.services.validators,
            http_client: &ctx.services.http_client,
        };

        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: turn_response.as_ref(),
            turn_tool_calls: &turn_tool_calls,
            history: &state.messages,
        };

        let mut violations: Vec<ValidationError> = element
            .metadata
            .get(keys::VIOLATIONS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        for assertion in &assertions {
            let outcome = evaluate(assertion, &input, &eval_ctx).await?;
            let passed = outcome.is_none();
            conductor_domain::trace::TraceEvent::ValidationEvaluated {
                run_id: ctx.run.run_id.clone(),
                assertion_type: assertion.type_name().to_string(),
                passed,
            }
            .emit();
            if let Some(violation) = outcome {
                if ctx.run.suppress_validation {
                    // §4.1 step 7 / §7: validation is the one error category
                    // allowed to demote to a warning instead of surfacing.
                    tracing::warn!(
                        run_id = %ctx.run.run_id,
                        assertion_type = assertion.type_name(),
                        detail = %violation.detail,
                        "validation failure suppressed by execution config"
                    );
                } else {
                    violations.push(violation);
                }
            }
        }

        element
            .metadata
            .insert(keys::VIOLATIONS.into(), serde_json::to_value(&violations).unwrap_or_default());
        Ok(vec![element])
    }
}
