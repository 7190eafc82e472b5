use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prompt registry: task-type → prompt-config entries. Looked up by the
/// pipeline's `PromptAssemblyStage` using a scenario's `task_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRegistryConfig {
    #[serde(default)]
    pub prompts: HashMap<String, PromptConfig>,
}

/// One prompt configuration: a system template with `{{name}}`
/// placeholders, the tools allowed for turns assembled from it, and
/// free-form metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub system_template: String,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}
