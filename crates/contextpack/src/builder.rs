use conductor_domain::config::{ContextBudgetConfig, TruncationStrategy};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;

use crate::estimate::{estimate_message_tokens, estimate_total};
use crate::report::TruncationReport;
use crate::strategies::{self, RelevanceScorer, Summarizer};

/// Fits a message history into a token budget per a scenario's
/// [`ContextBudgetConfig`]. A budget of `0` is the caller's signal to skip
/// this stage entirely; [`Self::build`] still honors it defensively by
/// returning the messages unchanged.
pub struct ContextBuilder;

impl ContextBuilder {
    pub async fn build(
        messages: &[Message],
        config: &ContextBudgetConfig,
        summarizer: Option<&dyn Summarizer>,
        relevance: Option<&dyn RelevanceScorer>,
    ) -> Result<(Vec<Message>, TruncationReport)> {
        let budget = config.token_budget as usize;
        let tokens_before = estimate_total(messages);

        if budget == 0 || tokens_before <= budget {
            return Ok((
                messages.to_vec(),
                TruncationReport::unapplied(config.strategy, budget, tokens_before),
            ));
        }

        let (kept, dropped, summarized) = match config.strategy {
            TruncationStrategy::Oldest => {
                let (kept, dropped) = strategies::apply_oldest(messages, budget, estimate_message_tokens);
                (kept, dropped, 0)
            }
            TruncationStrategy::Fail => {
                return Err(Error::Other(format!(
                    "context budget exceeded: {tokens_before} tokens over a budget of {budget} (strategy=fail)"
                )));
            }
            TruncationStrategy::Relevance => {
                let scorer = relevance.ok_or_else(|| {
                    Error::Config("strategy \"relevance\" requires a RelevanceScorer".into())
                })?;
                let (kept, dropped) =
                    strategies::apply_relevance(messages, budget, estimate_message_tokens, scorer).await?;
                (kept, dropped, 0)
            }
            TruncationStrategy::Summarize => {
                let summarizer = summarizer.ok_or_else(|| {
                    Error::Config("strategy \"summarize\" requires a Summarizer".into())
                })?;
                let max_chars = config
                    .summarizer
                    .as_ref()
                    .map(|s| s.max_summary_chars)
                    .unwrap_or(2_000);
                let (kept, summarized) = strategies::apply_summarize(
                    messages,
                    budget,
                    max_chars,
                    estimate_message_tokens,
                    summarizer,
                )
                .await?;
                (kept, 0, summarized)
            }
        };

        let tokens_after = estimate_total(&kept);
        Ok((
            kept,
            TruncationReport {
                strategy: config.strategy,
                budget_tokens: budget,
                tokens_before,
                tokens_after,
                messages_dropped: dropped,
                messages_summarized: summarized,
                applied: true,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::config::SummarizerConfig;

    fn messages(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message::user("x".repeat(40) + &i.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn zero_budget_skips_truncation() {
        let config = ContextBudgetConfig {
            token_budget: 0,
            ..ContextBudgetConfig::default()
        };
        let msgs = messages(20);
        let (kept, report) = ContextBuilder::build(&msgs, &config, None, None).await.unwrap();
        assert_eq!(kept.len(), msgs.len());
        assert!(!report.applied);
    }

    #[tokio::test]
    async fn under_budget_is_a_no_op() {
        let config = ContextBudgetConfig {
            token_budget: 10_000,
            ..ContextBudgetConfig::default()
        };
        let msgs = messages(3);
        let (kept, report) = ContextBuilder::build(&msgs, &config, None, None).await.unwrap();
        assert_eq!(kept.len(), 3);
        assert!(!report.applied);
    }

    #[tokio::test]
    async fn oldest_strategy_truncates_over_budget_history() {
        let config = ContextBudgetConfig {
            token_budget: 20,
            strategy: TruncationStrategy::Oldest,
            ..ContextBudgetConfig::default()
        };
        let msgs = messages(20);
        let (kept, report) = ContextBuilder::build(&msgs, &config, None, None).await.unwrap();
        assert!(kept.len() < msgs.len());
        assert!(report.applied);
        assert!(report.messages_dropped > 0);
    }

    #[tokio::test]
    async fn fail_strategy_errors_over_budget() {
        let config = ContextBudgetConfig {
            token_budget: 10,
            strategy: TruncationStrategy::Fail,
            ..ContextBudgetConfig::default()
        };
        let msgs = messages(20);
        let err = ContextBuilder::build(&msgs, &config, None, None).await.unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }

    #[tokio::test]
    async fn summarize_without_summarizer_is_config_error() {
        let config = ContextBudgetConfig {
            token_budget: 10,
            strategy: TruncationStrategy::Summarize,
            summarizer: Some(SummarizerConfig {
                provider_id: "judge-1".into(),
                max_summary_chars: 200,
            }),
            ..ContextBudgetConfig::default()
        };
        let msgs = messages(20);
        let err = ContextBuilder::build(&msgs, &config, None, None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
