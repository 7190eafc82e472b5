//! `conductor-runner` — the run planner and executor (§4.2): turns a set
//! of scenarios, a provider registry, and a set of prompt packs into an
//! enumerated [`RunPlan`](conductor_domain::run::RunPlan), then drives
//! each surviving entry through a fresh pipeline and collects
//! [`RunResult`](conductor_domain::run::RunResult)s.
//!
//! Also hosts the eval workflow (§4.6): evaluating a scenario's
//! conversation-level assertions against a previously recorded
//! conversation instead of a live run.

pub mod eval;
pub mod executor;
pub mod planner;

pub use eval::evaluate_recording;
pub use executor::Executor;
pub use planner::{plan, PlanFilter};
