use async_trait::async_trait;
use conductor_domain::error::Result;

/// Executes a single tool call and returns its result as a string. Callers
/// are responsible for turning that into a `Message::tool_result` or
/// `Message::tool_error` — the executor only ever reports success/failure of
/// the call itself, never the provider-facing encoding.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, arguments: serde_json::Value) -> Result<String>;
}
