use std::collections::HashMap;
use std::sync::Arc;

use conductor_domain::config::ToolsConfig;
use conductor_domain::error::{Error, Result};
use conductor_domain::tool::ToolDefinition;
use conductor_mcp_client::McpManager;

use crate::a2a::A2aExecutor;
use crate::executor::ToolExecutor;
use crate::http::HttpExecutor;
use crate::local::LocalHandlerFn;
use crate::local::LocalExecutor;
use crate::mcp::McpExecutor;

struct RegisteredTool {
    definition: ToolDefinition,
    executor: Arc<dyn ToolExecutor>,
}

/// Holds every tool available to a run: its advertised definition (for the
/// provider's tool-calling API) and the executor that carries out a call.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a registry from config. `local_handlers` supplies the
    /// callable for every `local` tool by name — a name with no matching
    /// handler is a configuration error, since the engine has no other way
    /// to execute it. `mcp_manager` is the already-initialized manager
    /// (server connections are an async, fallible startup step owned by
    /// the caller, not this constructor).
    pub fn from_config(
        config: &ToolsConfig,
        mut local_handlers: HashMap<String, LocalHandlerFn>,
        mcp_manager: Option<Arc<McpManager>>,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for local in &config.local {
            let handler = local_handlers.remove(&local.name).ok_or_else(|| {
                Error::Config(format!(
                    "local tool '{}' is declared in config but no handler was registered for it",
                    local.name
                ))
            })?;
            registry.register(
                ToolDefinition::new(local.name.clone(), local.description.clone())
                    .with_parameters(local.parameters.clone()),
                Arc::new(LocalExecutor::new(handler)),
            );
        }

        for http in &config.http {
            let definition = ToolDefinition::new(http.name.clone(), http.description.clone())
                .with_parameters(http.parameters.clone());
            registry.register(definition, Arc::new(HttpExecutor::new(http.clone())));
        }

        for agent in &config.a2a_agents {
            for skill in &agent.skills {
                let name = format!("a2a__{}__{}", agent.agent_id, skill.skill_id);
                let definition = ToolDefinition::new(name.clone(), skill.description.clone())
                    .with_parameters(skill.parameters.clone());
                let executor = A2aExecutor::new(
                    agent.agent_id.clone(),
                    skill.skill_id.clone(),
                    agent.base_url.clone(),
                );
                registry.register(definition, Arc::new(executor));
            }
        }

        if let Some(manager) = mcp_manager {
            for (server_id, tool) in manager.list_tools() {
                let name = format!("mcp:{server_id}:{}", tool.name);
                let definition =
                    ToolDefinition::new(name.clone(), tool.description.clone()).with_parameters(tool.input_schema.clone());
                let executor = McpExecutor::new(manager.clone(), server_id, tool.name.clone());
                registry.register(definition, Arc::new(executor));
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, definition: ToolDefinition, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool { definition, executor },
        );
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition.clone()).collect()
    }

    pub fn get_executor(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).map(|t| t.executor.clone())
    }

    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<String> {
        let executor = self.get_executor(name).ok_or_else(|| Error::ToolExecution {
            tool_name: name.to_string(),
            message: "no tool registered with this name".into(),
        })?;
        executor.execute(arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
