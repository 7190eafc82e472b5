use serde::Serialize;

/// Structured trace events emitted across all conductor crates: one
/// `tracing::info!` call per event, payload serialized as JSON so it is
/// both human-readable and machine-parseable.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    PlanBuilt {
        total_runs: usize,
        dropped: usize,
    },
    CapabilityGated {
        scenario_id: String,
        provider_id: String,
        missing: Vec<String>,
    },
    RunStarted {
        run_id: String,
        scenario_id: String,
        provider_id: String,
    },
    RunCompleted {
        run_id: String,
        duration_ms: i64,
        passed: bool,
    },
    RunFailed {
        run_id: String,
        error: String,
    },
    StageStarted {
        run_id: String,
        stage: String,
    },
    StageCompleted {
        run_id: String,
        stage: String,
        duration_ms: u64,
    },
    StageFailed {
        run_id: String,
        stage: String,
        error: String,
    },
    ToolCallDispatched {
        run_id: String,
        call_id: String,
        tool_name: String,
    },
    ToolCallCompleted {
        run_id: String,
        call_id: String,
        tool_name: String,
        duration_ms: u64,
        is_error: bool,
    },
    ToolCapExceeded {
        run_id: String,
        kind: String,
    },
    ValidationEvaluated {
        run_id: String,
        assertion_type: String,
        passed: bool,
    },
    RecordingWritten {
        run_id: String,
        path: String,
        event_count: usize,
    },
    RecordingLoaded {
        source: String,
        id: String,
        message_count: usize,
    },
    RepositorySaveCompleted {
        repository: String,
        count: usize,
    },
    RepositorySaveFailed {
        repository: String,
        error: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "orchestrator_event");
    }
}
