use async_trait::async_trait;
use conductor_contextpack::ContextBuilder;
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};

/// Trims the conversation's accumulated history to the scenario's token
/// budget before it reaches a provider (§4.1 step 5, optional — the
/// executor only wires this stage in when `context_budget.token_budget >
/// 0`). Reads and rewrites `metadata[CONVERSATION_STATE]` in place.
pub struct ContextBuilderStage;

#[async_trait]
impl Stage for ContextBuilderStage {
    fn name(&self) -> &str {
        "context_builder"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let Some(raw_state) = element.metadata.get(keys::CONVERSATION_STATE).cloned() else {
            return Ok(vec![element]);
        };
        let mut state: ConversationState = serde_json::from_value(raw_state)?;

        let (kept, report) = ContextBuilder::build(
            &state.messages,
            &ctx.services.context_budget,
            ctx.services.summarizer.as_deref(),
            ctx.services.relevance.as_deref(),
        )
        .await?;

        state.messages = kept;
        element.metadata.insert(
            keys::CONVERSATION_STATE.into(),
            serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
        );
        element.metadata.insert(
            keys::CONTEXT_TRUNCATION_REPORT.into(),
            serde_json::to_value(&report).unwrap_or(serde_json::Value::Null),
        );
        Ok(vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use chrono::Utc;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::message::Message;
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    fn ctx(context_budget: ContextBudgetConfig) -> StageContext {
        StageContext {
            run: RunContext {
                run_id: "r1".into(),
                conversation_id: "c1".into(),
                task_type: "default".into(),
                provider_id: "p1".into(),
                tool_policy: ToolPolicy::default(),
                suppress_validation: false,
            },
            cancel: CancelToken::new(),
            services: Arc::new(PipelineServices::new(
                Arc::new(ProviderRegistry::new()),
                Arc::new(ToolRegistry::new()),
                Arc::new(ValidatorRegistry::new()),
                PromptRegistryConfig::default(),
                context_budget,
            )),
        }
    }

    fn element_with_messages(n: usize) -> StreamElement {
        let mut state = ConversationState::new("c1", Utc::now());
        for i in 0..n {
            state.append(Message::user("x".repeat(40) + &i.to_string()));
        }
        let mut element = StreamElement::new();
        element
            .metadata
            .insert(keys::CONVERSATION_STATE.into(), serde_json::to_value(&state).unwrap());
        element
    }

    #[tokio::test]
    async fn missing_conversation_state_is_a_no_op() {
        let stage = ContextBuilderStage;
        let out = stage
            .process(StreamElement::new(), &ctx(ContextBudgetConfig::default()))
            .await
            .unwrap();
        assert!(out[0].metadata.get(keys::CONTEXT_TRUNCATION_REPORT).is_none());
    }

    #[tokio::test]
    async fn truncates_over_budget_history_in_place() {
        let config = ContextBudgetConfig {
            token_budget: 20,
            ..ContextBudgetConfig::default()
        };
        let element = element_with_messages(20);
        let stage = ContextBuilderStage;
        let out = stage.process(element, &ctx(config)).await.unwrap();

        let state: ConversationState =
            serde_json::from_value(out[0].metadata.get(keys::CONVERSATION_STATE).unwrap().clone()).unwrap();
        assert!(state.messages.len() < 20);

        let report = out[0].metadata.get(keys::CONTEXT_TRUNCATION_REPORT).unwrap();
        assert_eq!(report["applied"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn zero_budget_leaves_history_untouched() {
        let element = element_with_messages(5);
        let stage = ContextBuilderStage;
        let out = stage
            .process(element, &ctx(ContextBudgetConfig::default()))
            .await
            .unwrap();
        let state: ConversationState =
            serde_json::from_value(out[0].metadata.get(keys::CONVERSATION_STATE).unwrap().clone()).unwrap();
        assert_eq!(state.messages.len(), 5);
    }
}
