use serde::{Deserialize, Serialize};

/// `ContextBuilderStage` is only inserted into the built pipeline when
/// `token_budget > 0`; a budget of `0` means the stage is skipped entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBudgetConfig {
    #[serde(default)]
    pub token_budget: u32,
    #[serde(default)]
    pub strategy: TruncationStrategy,
    /// Required when `strategy = "summarize"` — the spec deliberately
    /// leaves the summarizer's provider contract unconfigured by default
    /// (§9 Open Questions) so it must be set explicitly rather than
    /// silently inherit some other provider's defaults.
    #[serde(default)]
    pub summarizer: Option<SummarizerConfig>,
    /// Used when `strategy = "relevance"`.
    #[serde(default)]
    pub relevance: RelevanceConfig,
}

impl Default for ContextBudgetConfig {
    fn default() -> Self {
        Self {
            token_budget: 0,
            strategy: TruncationStrategy::Oldest,
            summarizer: None,
            relevance: RelevanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Drop oldest non-system messages until under budget.
    #[default]
    Oldest,
    /// Collapse older messages into a single synthesized-summary system note.
    Summarize,
    /// Rank by embedding-relevance against the most recent user turn, drop
    /// the lowest-ranked first.
    Relevance,
    /// Return a budget-exceeded error without truncation.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub provider_id: String,
    #[serde(default = "default_summary_chars")]
    pub max_summary_chars: usize,
}

fn default_summary_chars() -> usize {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    pub embedding_provider_id: Option<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            embedding_provider_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_means_stage_is_skipped() {
        let cfg = ContextBudgetConfig::default();
        assert_eq!(cfg.token_budget, 0);
    }

    #[test]
    fn summarize_strategy_deserializes() {
        let json = r#"{"token_budget": 4000, "strategy": "summarize",
            "summarizer": {"provider_id": "mock-1", "max_summary_chars": 500}}"#;
        let cfg: ContextBudgetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.strategy, TruncationStrategy::Summarize);
        assert_eq!(cfg.summarizer.unwrap().max_summary_chars, 500);
    }
}
