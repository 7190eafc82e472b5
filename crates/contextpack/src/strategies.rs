use async_trait::async_trait;
use conductor_domain::error::Result;
use conductor_domain::message::{Message, Role};

/// Collapses a run of older messages into a short synthesized note.
/// Implemented by whatever owns a `Provider` handle (§4.7's `Summarize`
/// strategy is deliberately left without a built-in implementation — the
/// spec requires an explicit `summarizer` provider id rather than silently
/// reusing the run's main provider).
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, messages: &[Message], max_chars: usize) -> Result<String>;
}

/// Scores a candidate message's relevance to the current query (most
/// recent user turn), higher is more relevant. Backed by an embedding
/// provider the caller configures separately.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, query: &[Message], candidate: &Message) -> Result<f64>;
}

/// Drop oldest non-system messages (front of the slice, excluding any
/// `Role::System` entries) until `budget_tokens` is no longer exceeded.
/// Returns the retained messages and how many were dropped.
pub fn apply_oldest(
    messages: &[Message],
    budget_tokens: usize,
    token_of: impl Fn(&Message) -> usize,
) -> (Vec<Message>, usize) {
    let mut kept: Vec<Message> = messages.to_vec();
    let mut dropped = 0;
    let mut total: usize = kept.iter().map(&token_of).sum();

    while total > budget_tokens {
        let drop_at = kept.iter().position(|m| m.role != Role::System);
        match drop_at {
            Some(idx) => {
                total -= token_of(&kept[idx]);
                kept.remove(idx);
                dropped += 1;
            }
            None => break, // only system messages remain, nothing more to drop
        }
    }

    (kept, dropped)
}

/// Rank non-system messages by relevance to the latest user turn, drop the
/// lowest-scoring ones first until under budget.
pub async fn apply_relevance(
    messages: &[Message],
    budget_tokens: usize,
    token_of: impl Fn(&Message) -> usize,
    scorer: &dyn RelevanceScorer,
) -> Result<(Vec<Message>, usize)> {
    let query: Vec<Message> = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .cloned()
        .into_iter()
        .collect();

    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(messages.len());
    for (idx, message) in messages.iter().enumerate() {
        if message.role == Role::System {
            continue;
        }
        let score = scorer.score(&query, message).await?;
        scored.push((idx, score));
    }
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut dropped_indices: std::collections::HashSet<usize> = std::collections::HashSet::new();
    let mut total: usize = messages.iter().map(&token_of).sum();

    for (idx, _) in &scored {
        if total <= budget_tokens {
            break;
        }
        total -= token_of(&messages[*idx]);
        dropped_indices.insert(*idx);
    }

    let kept: Vec<Message> = messages
        .iter()
        .enumerate()
        .filter(|(idx, _)| !dropped_indices.contains(idx))
        .map(|(_, m)| m.clone())
        .collect();

    Ok((kept, dropped_indices.len()))
}

/// Summarize oldest non-system messages in small batches, replacing each
/// batch with a single system note, until under budget or nothing left to
/// collapse.
pub async fn apply_summarize(
    messages: &[Message],
    budget_tokens: usize,
    max_summary_chars: usize,
    token_of: impl Fn(&Message) -> usize,
    summarizer: &dyn Summarizer,
) -> Result<(Vec<Message>, usize)> {
    const BATCH_SIZE: usize = 4;

    let mut kept: Vec<Message> = messages.to_vec();
    let mut summarized = 0;
    let mut total: usize = kept.iter().map(&token_of).sum();

    while total > budget_tokens {
        let non_system_indices: Vec<usize> = kept
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role != Role::System)
            .map(|(i, _)| i)
            .collect();

        if non_system_indices.is_empty() {
            break;
        }

        let batch_end = non_system_indices.len().min(BATCH_SIZE);
        let batch_indices = &non_system_indices[..batch_end];
        let batch: Vec<Message> = batch_indices.iter().map(|&i| kept[i].clone()).collect();

        let summary_text = summarizer.summarize(&batch, max_summary_chars).await?;
        let summary_message = Message::system(format!("[summarized context]\n{summary_text}"));

        let first_idx = batch_indices[0];
        let last_idx = *batch_indices.last().unwrap();
        let removed_tokens: usize = batch.iter().map(&token_of).sum();
        let added_tokens = token_of(&summary_message);

        kept.splice(first_idx..=last_idx, std::iter::once(summary_message));
        summarized += batch.len();
        total = total - removed_tokens + added_tokens;
    }

    Ok((kept, summarized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::estimate_message_tokens;

    #[test]
    fn apply_oldest_preserves_system_messages() {
        let messages = vec![
            Message::system("you are a helpful test harness"),
            Message::user("one"),
            Message::user("two"),
            Message::user("three"),
        ];
        let (kept, dropped) = apply_oldest(&messages, 8, estimate_message_tokens);
        assert!(kept.iter().any(|m| m.role == Role::System));
        assert!(dropped > 0);
        assert!(kept.len() < messages.len());
    }

    #[test]
    fn apply_oldest_stops_dropping_once_under_budget() {
        let messages = vec![Message::user("hi")];
        let (kept, dropped) = apply_oldest(&messages, 10_000, estimate_message_tokens);
        assert_eq!(dropped, 0);
        assert_eq!(kept.len(), 1);
    }

    struct FixedScorer;
    #[async_trait]
    impl RelevanceScorer for FixedScorer {
        async fn score(&self, _query: &[Message], candidate: &Message) -> Result<f64> {
            // Score by message length — shorter messages score lower.
            Ok(candidate.all_text().len() as f64)
        }
    }

    #[tokio::test]
    async fn apply_relevance_drops_lowest_scoring_first() {
        let messages = vec![
            Message::user("short"),
            Message::user("a much longer message that scores higher"),
        ];
        let (kept, dropped) = apply_relevance(&messages, 12, estimate_message_tokens, &FixedScorer)
            .await
            .unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].all_text().contains("longer"));
    }

    struct FixedSummarizer;
    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, messages: &[Message], _max_chars: usize) -> Result<String> {
            Ok(format!("{} messages summarized", messages.len()))
        }
    }

    #[tokio::test]
    async fn apply_summarize_collapses_a_batch() {
        let messages: Vec<Message> = (0..6).map(|i| Message::user(format!("message {i}"))).collect();
        let (kept, summarized) =
            apply_summarize(&messages, 4, 200, estimate_message_tokens, &FixedSummarizer)
                .await
                .unwrap();
        assert!(summarized > 0);
        assert!(kept.len() < messages.len());
        assert!(kept.iter().any(|m| m.role == Role::System));
    }
}
