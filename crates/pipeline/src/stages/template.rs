use async_trait::async_trait;
use conductor_domain::conversation::StreamElement;
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};

/// Copies the assembled system prompt into the explicit prompt slot
/// provider stages read from (§4.1 step 4). Running it twice is a no-op,
/// since it only ever copies one key to another.
pub struct TemplateStage;

#[async_trait]
impl Stage for TemplateStage {
    fn name(&self) -> &str {
        "template"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        if let Some(prompt) = element.metadata.get(keys::SYSTEM_PROMPT).cloned() {
            element.metadata.insert(keys::PROMPT.into(), prompt);
        }
        Ok(vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    fn ctx() -> StageContext {
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
                ContextBudgetConfig::default(),
            )),
        }
    }

    #[tokio::test]
    async fn copies_system_prompt_into_prompt_slot() {
        let mut element = StreamElement::new();
        element
            .metadata
            .insert(keys::SYSTEM_PROMPT.into(), serde_json::json!("be helpful"));
        let stage = TemplateStage;
        let out = stage.process(element, &ctx()).await.unwrap();
        assert_eq!(out[0].metadata.get(keys::PROMPT), Some(&serde_json::json!("be helpful")));
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let mut element = StreamElement::new();
        element
            .metadata
            .insert(keys::SYSTEM_PROMPT.into(), serde_json::json!("be helpful"));
        let stage = TemplateStage;
        let once = stage.process(element, &ctx()).await.unwrap();
        let twice = stage.process(once[0].clone(), &ctx()).await.unwrap();
        assert_eq!(twice[0].metadata.get(keys::PROMPT), Some(&serde_json::json!("be helpful")));
    }
}
