//! Shared data model for the conductor test-orchestration engine: messages,
//! conversation state, scenarios, assertions, run plans/results, recording
//! references, and the parsed configuration shape. Every other crate in
//! the workspace depends on this one and nothing else in it.

pub mod assertion;
pub mod audio;
pub mod capability;
pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod recording;
pub mod run;
pub mod scenario;
pub mod stream;
pub mod tool;
pub mod trace;

pub use assertion::{Assertion, AssertionScope, ValidationError};
pub use audio::AudioFrame;
pub use capability::{Capability, LlmCapabilities, ToolSupport};
pub use config::{Config, ConfigError, ConfigSeverity};
pub use conversation::{
    ConversationState, ControlMarker, ElementPayload, ExecutionContext, ExecutionResult, Response,
    StreamElement,
};
pub use error::{Error, Result};
pub use message::{ContentPart, Dimensions, MediaRef, Message, Role, ToolCall, ToolResult};
pub use recording::{
    Annotation, JudgeTarget, ProviderInfo, RecordingFormat, RecordingMetadata, RecordingRef,
    TimeRange,
};
pub use run::{CostInfo, ResultSummary, RunDescriptor, RunPlan, RunResult, RunResultBuilder};
pub use scenario::{PersonaRef, Scenario, ToolChoice, ToolPolicy, Turn, TurnContent};
pub use stream::{BoxStream, StreamEvent, Usage};
pub use tool::ToolDefinition;
pub use trace::TraceEvent;
