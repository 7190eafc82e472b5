use std::sync::Arc;

use async_trait::async_trait;
use conductor_domain::error::{Error, Result};
use conductor_mcp_client::McpManager;

use crate::executor::ToolExecutor;

/// Delegates a tool call to a server managed by `conductor-mcp-client`.
/// Tools of this kind are named `mcp:{server_id}:{tool}` by convention.
pub struct McpExecutor {
    manager: Arc<McpManager>,
    server_id: String,
    tool_name: String,
}

impl McpExecutor {
    pub fn new(manager: Arc<McpManager>, server_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            manager,
            server_id: server_id.into(),
            tool_name: tool_name.into(),
        }
    }
}

#[async_trait]
impl ToolExecutor for McpExecutor {
    async fn execute(&self, arguments: serde_json::Value) -> Result<String> {
        let result = self
            .manager
            .call_tool(&self.server_id, &self.tool_name, arguments)
            .await
            .map_err(|e| Error::ToolExecution {
                tool_name: format!("mcp:{}:{}", self.server_id, self.tool_name),
                message: e.to_string(),
            })?;

        let text = result
            .content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if result.is_error {
            return Err(Error::ToolExecution {
                tool_name: format!("mcp:{}:{}", self.server_id, self.tool_name),
                message: text,
            });
        }

        Ok(text)
    }
}
