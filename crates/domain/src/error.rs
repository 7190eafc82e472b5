/// Shared error type used across all conductor crates.
///
/// Variants track the error taxonomy the engine is built around: most
/// callers match on the kind rather than the message to decide whether a
/// failure aborts a run, drops a plan entry, or demotes to a warning.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    /// A provider lacks a capability a scenario requires. Not a failure —
    /// the planner drops the combination and logs the reason.
    #[error("provider {provider_id} lacks required capabilities for scenario {scenario_id}: {missing:?}")]
    Capability {
        scenario_id: String,
        provider_id: String,
        missing: Vec<String>,
    },

    #[error("tool {tool_name} execution failed: {message}")]
    ToolExecution { tool_name: String, message: String },

    /// The validator machinery itself failed (crashed constructor, panic
    /// during construction), distinct from an assertion that evaluated
    /// cleanly to "failed".
    #[error("validator {validator_name} machinery error: {message}")]
    ValidatorMachinery {
        validator_name: String,
        message: String,
    },

    #[error("state store: {0}")]
    StateStore(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Wraps N underlying errors from a fan-out operation (composite
    /// repository, multi-child save), preserving each child's index.
    #[error("{operation} failed for {} of its children", failures.len())]
    Composite {
        operation: String,
        failures: Vec<(usize, String)>,
    },

    #[error("variable provider {provider} failed: {message}")]
    VariableProvider { provider: String, message: String },

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
