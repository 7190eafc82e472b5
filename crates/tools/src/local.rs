use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use conductor_domain::error::Result;

use crate::executor::ToolExecutor;

/// A boxed handler supplied by the process embedding the engine at
/// startup — the only way a `local` tool's behavior is wired up, since
/// config can only carry its name and schema.
pub type LocalHandlerFn =
    Arc<dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

/// Executes a tool entirely in-process via a caller-supplied handler.
#[derive(Clone)]
pub struct LocalExecutor {
    handler: LocalHandlerFn,
}

impl LocalExecutor {
    pub fn new(handler: LocalHandlerFn) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl ToolExecutor for LocalExecutor {
    async fn execute(&self, arguments: serde_json::Value) -> Result<String> {
        (self.handler)(arguments).await
    }
}
