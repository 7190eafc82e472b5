//! `conductor-tools` — the tool registry and executors a run's provider
//! stage dispatches tool calls through (§4.7).
//!
//! Four executor kinds cover the tool surface: `local` (in-process
//! handlers supplied by the embedding binary), `http` (templated request/
//! response), `a2a` (agent-to-agent skill bridging), and `mcp` (delegated
//! to a `conductor-mcp-client` server connection). [`policy::ToolCallGovernor`]
//! enforces a scenario's [`conductor_domain::scenario::ToolPolicy`] across
//! the calls a turn and a conversation are allowed to make.

pub mod a2a;
pub mod executor;
pub mod http;
pub mod local;
pub mod mcp;
pub mod policy;
pub mod registry;
pub mod scoped_temp;

pub use executor::ToolExecutor;
pub use local::LocalHandlerFn;
pub use policy::{GovernorViolation, ToolCallGovernor};
pub use registry::ToolRegistry;
pub use scoped_temp::ScopedTempFile;
