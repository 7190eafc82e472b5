use conductor_domain::config::TruncationStrategy;
use serde::{Deserialize, Serialize};

/// Outcome of a single context-budget pass: whether truncation ran, which
/// strategy handled it, and how much it changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncationReport {
    pub strategy: TruncationStrategy,
    pub budget_tokens: usize,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub messages_dropped: usize,
    pub messages_summarized: usize,
    pub applied: bool,
}

impl TruncationReport {
    pub fn unapplied(strategy: TruncationStrategy, budget_tokens: usize, tokens: usize) -> Self {
        Self {
            strategy,
            budget_tokens,
            tokens_before: tokens,
            tokens_after: tokens,
            messages_dropped: 0,
            messages_summarized: 0,
            applied: false,
        }
    }
}
