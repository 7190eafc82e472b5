//! `conductor-pipeline` — the stage runtime a run plays a scenario's
//! turns through (§4.1): state-store load, variable resolution, prompt
//! assembly, templating, optional context-budget truncation, the
//! provider's tool-call loop, turn validation, and state-store save.
//!
//! [`builder::PipelineBuilder::standard`] assembles the engine's default
//! stage order; [`sync_exec::run_sync`] drives it turn-by-turn for
//! ordinary text conversations, and [`streaming::run_streaming`] drives
//! it as one coroutine per stage for duplex/streaming scenarios.

pub mod builder;
pub mod cancel;
pub mod services;
pub mod stage;
pub mod stages;
pub mod sync_exec;
pub mod streaming;
pub mod variables;

pub use builder::{Pipeline, PipelineBuilder};
pub use cancel::CancelToken;
pub use services::PipelineServices;
pub use stage::{RunContext, Stage, StageContext};
pub use sync_exec::run_sync;
pub use variables::{resolve_variables, VariableProvider};
