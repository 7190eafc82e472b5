//! Deterministic mock provider (`ProviderKind::Mock`) — the builtin
//! provider used by S1/S3-style scripted scenarios and by unit tests
//! throughout the workspace that need a `Provider` without a network call.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use conductor_domain::capability::LlmCapabilities;
use conductor_domain::error::Result;
use conductor_domain::message::Role;
use conductor_domain::stream::{BoxStream, StreamEvent, Usage};

use crate::traits::{ChatRequest, ChatResponse, Provider};

enum Behavior {
    /// Echo the last user message back, prefixed so assertions like
    /// `content_includes: ["Hello"]` can match the original text (§8 S1).
    Echo,
    /// Replay a fixed queue of responses in order; once exhausted, repeats
    /// the last one if `repeat_last` is set, else errors.
    Scripted {
        queue: VecDeque<ChatResponse>,
        repeat_last: Option<ChatResponse>,
    },
}

pub struct MockProvider {
    provider_id: String,
    capabilities: LlmCapabilities,
    behavior: Mutex<Behavior>,
    calls: Mutex<u32>,
}

impl MockProvider {
    /// An echoing mock: every call returns an assistant message that
    /// contains the text of the most recent user turn.
    pub fn echo(provider_id: impl Into<String>, capabilities: LlmCapabilities) -> Self {
        Self {
            provider_id: provider_id.into(),
            capabilities,
            behavior: Mutex::new(Behavior::Echo),
            calls: Mutex::new(0),
        }
    }

    /// A scripted mock: returns `responses` in order. When `repeat_final`
    /// is `true`, every call past the end of the script repeats the last
    /// scripted response (used by S3 to script "always emit a tool call").
    pub fn scripted(
        provider_id: impl Into<String>,
        capabilities: LlmCapabilities,
        responses: Vec<ChatResponse>,
        repeat_final: bool,
    ) -> Self {
        let repeat_last = if repeat_final {
            responses.last().cloned()
        } else {
            None
        };
        Self {
            provider_id: provider_id.into(),
            capabilities,
            behavior: Mutex::new(Behavior::Scripted {
                queue: responses.into(),
                repeat_last,
            }),
            calls: Mutex::new(0),
        }
    }

    /// Number of `predict` calls served so far.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn predict(&self, req: ChatRequest) -> Result<ChatResponse> {
        *self.calls.lock() += 1;
        let model = req.model.clone().unwrap_or_else(|| "mock".to_string());

        let mut behavior = self.behavior.lock();
        match &mut *behavior {
            Behavior::Echo => {
                let last_user = req
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .and_then(|m| m.text_content())
                    .unwrap_or_default();
                Ok(ChatResponse::text(model, format!("echo: {last_user}")))
            }
            Behavior::Scripted { queue, repeat_last } => {
                if let Some(resp) = queue.pop_front() {
                    Ok(resp)
                } else if let Some(resp) = repeat_last.clone() {
                    Ok(resp)
                } else {
                    Err(conductor_domain::error::Error::Provider {
                        provider: self.provider_id.clone(),
                        message: "mock script exhausted".into(),
                    })
                }
            }
        }
    }

    async fn predict_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let response = self.predict(req).await?;
        Ok(Box::pin(async_stream::stream! {
            yield Ok(StreamEvent::Token { text: response.content.clone() });
            yield Ok(StreamEvent::Done {
                usage: response.usage.or(Some(Usage {
                    prompt_tokens: 0,
                    completion_tokens: 0,
                    total_tokens: 0,
                })),
                finish_reason: response.finish_reason.clone(),
            });
        }))
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::message::Message;

    #[tokio::test]
    async fn echo_mock_includes_user_text() {
        let provider = MockProvider::echo("mock-1", LlmCapabilities::default());
        let req = ChatRequest {
            messages: vec![Message::user("Hello")],
            ..Default::default()
        };
        let resp = provider.predict(req).await.unwrap();
        assert!(resp.content.contains("Hello"));
    }

    #[tokio::test]
    async fn scripted_mock_repeats_last_when_exhausted() {
        let provider = MockProvider::scripted(
            "mock-2",
            LlmCapabilities::default(),
            vec![ChatResponse::text("mock", "one")],
            true,
        );
        let req = ChatRequest::default();
        assert_eq!(provider.predict(req.clone()).await.unwrap().content, "one");
        assert_eq!(provider.predict(req).await.unwrap().content, "one");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_mock_errors_when_exhausted_without_repeat() {
        let provider = MockProvider::scripted(
            "mock-3",
            LlmCapabilities::default(),
            vec![ChatResponse::text("mock", "one")],
            false,
        );
        let req = ChatRequest::default();
        provider.predict(req.clone()).await.unwrap();
        assert!(provider.predict(req).await.is_err());
    }
}
