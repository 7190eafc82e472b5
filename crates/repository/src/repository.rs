//! The result-repository contract (§4.9): a sink for run results and
//! summaries. Multiple repositories compose behind [`crate::composite::CompositeRepository`].

use conductor_domain::error::Result;
use conductor_domain::run::{ResultSummary, RunResult};

#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Persist a full batch of results.
    async fn save_results(&self, batch: &[RunResult]) -> Result<()>;

    /// Persist the aggregate summary for a batch.
    async fn save_summary(&self, summary: &ResultSummary) -> Result<()>;

    /// Load a previously saved batch, when this repository supports it.
    /// Repositories that only write (e.g. HTML) return
    /// `Error::UnsupportedOperation`.
    async fn load_results(&self) -> Result<Vec<RunResult>>;

    /// Whether this repository can accept individual `save_result` calls
    /// as a run completes, rather than only a final batch.
    fn supports_streaming(&self) -> bool;

    /// Persist a single result as it becomes available. Only meaningful
    /// when `supports_streaming()` is `true`; non-streaming repositories
    /// return `Error::UnsupportedOperation`.
    async fn save_result(&self, result: &RunResult) -> Result<()>;
}
