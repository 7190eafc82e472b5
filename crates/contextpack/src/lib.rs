//! `conductor-contextpack` — fits a conversation's message history into a
//! token budget before it reaches a provider (§4: `ContextBuilderStage`).
//!
//! [`builder::ContextBuilder`] is the entry point: given a scenario's
//! [`conductor_domain::config::ContextBudgetConfig`], it applies one of
//! four truncation strategies (drop oldest, summarize, relevance-ranked
//! drop, or fail outright) once the estimated token count exceeds the
//! configured budget.

pub mod builder;
pub mod estimate;
pub mod report;
pub mod strategies;

pub use builder::ContextBuilder;
pub use report::TruncationReport;
pub use strategies::{RelevanceScorer, Summarizer};
