//! Replay provider (`ProviderKind::Replay`, §4.5) — wraps a recording so
//! it can satisfy the [`Provider`] interface deterministically. The
//! recording itself is loaded and translated into a response queue by a
//! higher layer (`conductor-recording`'s session adapter plus the run
//! wiring) since adapters sit above providers in the dependency order
//! (§2); this crate only knows how to play a pre-extracted queue back.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use conductor_domain::capability::LlmCapabilities;
use conductor_domain::error::{Error, Result};
use conductor_domain::stream::{BoxStream, StreamEvent, Usage};

use crate::traits::{ChatRequest, ChatResponse, Provider};

pub struct ReplayProvider {
    provider_id: String,
    capabilities: LlmCapabilities,
    responses: Mutex<VecDeque<ChatResponse>>,
}

impl ReplayProvider {
    pub fn new(
        provider_id: impl Into<String>,
        capabilities: LlmCapabilities,
        responses: Vec<ChatResponse>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            capabilities,
            responses: Mutex::new(responses.into()),
        }
    }

    /// Responses remaining before the recording is exhausted.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Provider for ReplayProvider {
    async fn predict(&self, _req: ChatRequest) -> Result<ChatResponse> {
        self.responses.lock().pop_front().ok_or_else(|| Error::Provider {
            provider: self.provider_id.clone(),
            message: "replay recording exhausted: no more recorded responses".into(),
        })
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
