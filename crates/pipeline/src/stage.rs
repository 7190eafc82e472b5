use async_trait::async_trait;
use conductor_domain::conversation::StreamElement;
use conductor_domain::error::{Error, Result};
use conductor_domain::scenario::ToolPolicy;

use crate::cancel::CancelToken;
use crate::services::PipelineServices;

/// Well-known keys a stage reads or writes on [`StreamElement::metadata`].
/// Stages communicate only through elements (§4.1), so these constants are
/// the entire cross-stage contract.
pub mod keys {
    pub const VARIABLES: &str = "variables";
    pub const SYSTEM_PROMPT: &str = "system_prompt";
    pub const ALLOWED_TOOLS: &str = "allowed_tools";
    pub const PROMPT: &str = "prompt";
    pub const CONVERSATION_STATE: &str = "conversation_state";
    pub const TURN_ASSERTIONS: &str = "turn_assertions";
    pub const VIOLATIONS: &str = "violations";
    pub const TOOL_VIOLATIONS: &str = "tool_violations";
    pub const CONTEXT_TRUNCATION_REPORT: &str = "context_truncation_report";
    pub const COST: &str = "cost";
    pub const RESPONSE: &str = "response";
    pub const TURN_TOOL_CALLS: &str = "turn_tool_calls";
    /// VAD stage chain (§4.1 step 6): audio frames `AudioTurnStage` has
    /// accumulated for one user turn, handed to `STTStage`.
    pub const ACCUMULATED_AUDIO: &str = "accumulated_audio";
}

/// Per-run identity and scenario wiring, constant for every turn and every
/// stage in one run. Distinct from [`StreamElement::metadata`], which
/// carries the per-element data a stage actually transforms.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub conversation_id: String,
    pub task_type: String,
    pub provider_id: String,
    pub tool_policy: ToolPolicy,
    /// §4.1 step 7 / §7: when set, `ValidationStage` logs violations as
    /// warnings instead of surfacing them on the element.
    pub suppress_validation: bool,
}

/// What a stage needs besides the element it's processing: the run's
/// identity, the shared cancellation flag, and the read-only collaborators
/// built once before execution began (§5: registries are immutable during
/// a plan's execution).
pub struct StageContext {
    pub run: RunContext,
    pub cancel: CancelToken,
    pub services: std::sync::Arc<PipelineServices>,
}

impl StageContext {
    /// Stages should call this before any unit of work that would be
    /// wasted on a cancelled run — most naturally right before a
    /// suspension point (provider call, tool dispatch, state-store I/O).
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// One link in the pipeline (§4.1). A stage is pure with respect to its
/// neighbors: it only ever reads and writes the [`StreamElement`] it's
/// handed, never reaches into another stage's state.
#[async_trait]
pub trait Stage: Send + Sync {
    /// A short, stable name used in trace events and stage-failure
    /// attribution.
    fn name(&self) -> &str;

    /// Consume one input element and produce zero or more output
    /// elements. Synchronous-mode pipelines call this once per stage;
    /// streaming-mode pipelines call it once per element received on the
    /// stage's input channel.
    async fn process(&self, element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>>;

    /// Sub-response streaming hook: forwards intermediate chunks as they
    /// become available instead of waiting for the full element. The
    /// default implementation runs [`Self::process`] to completion and
    /// forwards its output as a single chunk, which is correct (if not
    /// maximally incremental) for any stage that doesn't override it.
    async fn stream_chunk(
        &self,
        element: StreamElement,
        ctx: &StageContext,
        out: &tokio::sync::mpsc::Sender<StreamElement>,
    ) -> Result<()> {
        for output in self.process(element, ctx).await? {
            if out.send(output).await.is_err() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// Drain any buffered state at end-of-input. Most stages are
    /// stateless and keep the default no-op.
    async fn flush(&self, _ctx: &StageContext) -> Result<Vec<StreamElement>> {
        Ok(Vec::new())
    }
}

/// Wraps a stage failure with the name of the stage that produced it
/// (§4.1: "a stage failure aborts the pipeline; the error is attributed
/// to the stage").
pub fn attribute(stage_name: &str, err: Error) -> Error {
    match err {
        Error::Cancelled => Error::Cancelled,
        other => Error::Other(format!("stage \"{stage_name}\" failed: {other}")),
    }
}
