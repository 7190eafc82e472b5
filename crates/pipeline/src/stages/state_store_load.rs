use async_trait::async_trait;
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};

/// Loads the conversation's accumulated state before any other stage may
/// append to it (§4.1 step 1). A missing conversation starts fresh — a
/// state-store load failure is a warning, not a pipeline abort (§7: "if
/// load fails, the run starts fresh with a warning").
pub struct StateStoreLoadStage;

#[async_trait]
impl Stage for StateStoreLoadStage {
    fn name(&self) -> &str {
        "state_store_load"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let Some(store) = &ctx.services.state_store else {
            return Ok(vec![element]);
        };

        match store.load(&ctx.run.conversation_id).await {
            Ok(Some(state)) => {
                element.metadata.insert(
                    keys::CONVERSATION_STATE.into(),
                    serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
                );
            }
            Ok(None) => {
                let fresh = ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now());
                element.metadata.insert(
                    keys::CONVERSATION_STATE.into(),
                    serde_json::to_value(&fresh).unwrap_or(serde_json::Value::Null),
                );
            }
            Err(e) => {
                tracing::warn!(
                    run_id = %ctx.run.run_id,
                    conversation_id = %ctx.run.conversation_id,
                    error = %e,
                    "state store load failed, starting fresh"
                );
                let fresh = ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now());
                element.metadata.insert(
                    keys::CONVERSATION_STATE.into(),
                    serde_json::to_value(&fresh).unwrap_or(serde_json::Value::Null),
                );
            }
        }
        Ok(vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_sessions::store::InMemoryStateStore;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    fn ctx_with_store(store: Option<Arc<dyn conductor_sessions::store::StateStore>>) -> StageContext {
        let mut services = PipelineServices::new(
            Arc::new(ProviderRegistry::new()),
            Arc::new(ToolRegistry::new()),
            Arc::new(ValidatorRegistry::new()),
            PromptRegistryConfig::default(),
            ContextBudgetConfig::default(),
        );
        services.state_store = store;
        StageContext {
            run: RunContext {
                run_id: "r1".into(),
                conversation_id: "c1".into(),
                task_type: "default".into(),
                provider_id: "p1".into(),
                tool_policy: ToolPolicy::default(),
                suppress_validation: false,
            },
            cancel: crate::cancel::CancelToken::new(),
            services: Arc::new(services),
        }
    }

    #[tokio::test]
    async fn missing_conversation_starts_fresh() {
        let store: Arc<dyn conductor_sessions::store::StateStore> = Arc::new(InMemoryStateStore::new());
        let ctx = ctx_with_store(Some(store));
        let stage = StateStoreLoadStage;
        let out = stage.process(StreamElement::new(), &ctx).await.unwrap();
        let state = out[0].metadata.get(keys::CONVERSATION_STATE).unwrap();
        assert_eq!(state["conversation_id"], "c1");
        assert_eq!(state["messages"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn no_store_configured_is_a_no_op() {
        let ctx = ctx_with_store(None);
        let stage = StateStoreLoadStage;
        let out = stage.process(StreamElement::new(), &ctx).await.unwrap();
        assert!(out[0].metadata.get(keys::CONVERSATION_STATE).is_none());
    }
}
