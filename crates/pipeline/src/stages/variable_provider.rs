use std::collections::HashMap;

use async_trait::async_trait;
use conductor_domain::conversation::StreamElement;
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};
use crate::variables::resolve_variables;

/// Invokes every registered variable provider and merges the results into
/// the element's variable map (§4.1 step 2). Fixtures already present in
/// `metadata[VARIABLES]` (seeded by the executor from the scenario) act as
/// the starting map; providers may override them but not the other way
/// around.
pub struct VariableProviderStage;

#[async_trait]
impl Stage for VariableProviderStage {
    fn name(&self) -> &str {
        "variable_provider"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let seed: HashMap<String, String> = element
            .metadata
            .get(keys::VARIABLES)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let merged = resolve_variables(&ctx.services.variable_providers, seed).await?;
        element
            .metadata
            .insert(keys::VARIABLES.into(), serde_json::to_value(&merged).unwrap_or_default());
        Ok(vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use crate::variables::{StaticVariableProvider, VariableProvider};
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn provider_overrides_seeded_fixture() {
        let mut fixtures = HashMap::new();
        fixtures.insert("persona".into(), "from_fixture".into());
        let mut element = StreamElement::new();
        element
            .metadata
            .insert(keys::VARIABLES.into(), serde_json::to_value(&fixtures).unwrap());

        let mut provided = HashMap::new();
        provided.insert("persona".into(), "from_provider".into());
        let providers: Vec<Arc<dyn VariableProvider>> =
            vec![Arc::new(StaticVariableProvider::new("p", provided))];

        let mut services = PipelineServices::new(
            Arc::new(ProviderRegistry::new()),
            Arc::new(ToolRegistry::new()),
            Arc::new(ValidatorRegistry::new()),
            PromptRegistryConfig::default(),
            ContextBudgetConfig::default(),
        );
        services.variable_providers = providers;

        let ctx = StageContext {
            run: RunContext {
                run_id: "r1".into(),
                conversation_id: "c1".into(),
                task_type: "default".into(),
                provider_id: "p1".into(),
                tool_policy: ToolPolicy::default(),
                suppress_validation: false,
            },
            cancel: CancelToken::new(),
            services: Arc::new(services),
        };

        let stage = VariableProviderStage;
        let out = stage.process(element, &ctx).await.unwrap();
        let vars: HashMap<String, String> =
            serde_json::from_value(out[0].metadata.get(keys::VARIABLES).unwrap().clone()).unwrap();
        assert_eq!(vars.get("persona").map(String::as_str), Some("from_provider"));
    }
}
