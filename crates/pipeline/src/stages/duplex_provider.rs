use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use conductor_domain::audio::AudioFrame;
use conductor_domain::conversation::{ControlMarker, ElementPayload, StreamElement};
use conductor_domain::error::{Error, Result};
use conductor_providers::audio::DuplexSession;

use crate::stage::{keys, Stage, StageContext};

/// Bidirectional audio mode (§4.1 step 6): forwards input audio chunks
/// straight into a provider's native duplex session and relays whatever
/// the session produces back out as output elements, skipping the
/// STT/provider/TTS round trip entirely. One session is opened lazily on
/// the first chunk and kept for the stage's lifetime — the same
/// one-stage-instance-per-run lifetime every other stage assumes (§5).
#[derive(Default)]
pub struct DuplexProviderStage {
    session: Mutex<Option<Arc<dyn DuplexSession>>>,
}

impl DuplexProviderStage {
    pub fn new() -> Self {
        Self::default()
    }

    async fn ensure_session(&self, ctx: &StageContext, element: &StreamElement) -> Result<Arc<dyn DuplexSession>> {
        if let Some(session) = self.session.lock().clone() {
            return Ok(session);
        }

        let provider = ctx.services.duplex_providers.get(&ctx.run.provider_id).ok_or_else(|| {
            Error::Config(format!(
                "provider \"{}\" has no duplex session support",
                ctx.run.provider_id
            ))
        })?;
        let system_prompt = element
            .metadata
            .get(keys::SYSTEM_PROMPT)
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let opened: Arc<dyn DuplexSession> = Arc::from(provider.open_duplex_session(system_prompt).await?);

        let mut guard = self.session.lock();
        if let Some(existing) = guard.as_ref() {
            return Ok(Arc::clone(existing));
        }
        *guard = Some(Arc::clone(&opened));
        Ok(opened)
    }
}

#[async_trait]
impl Stage for DuplexProviderStage {
    fn name(&self) -> &str {
        "duplex_provider"
    }

    async fn process(&self, _element: StreamElement, _ctx: &StageContext) -> Result<Vec<StreamElement>> {
        Err(Error::UnsupportedOperation(
            "duplex_provider only runs in streaming mode (§4.1 step 6 is a duplex session, not a request/response turn)".into(),
        ))
    }

    async fn stream_chunk(
        &self,
        element: StreamElement,
        ctx: &StageContext,
        out: &tokio::sync::mpsc::Sender<StreamElement>,
    ) -> Result<()> {
        ctx.check_cancelled()?;

        match &element.payload {
            Some(ElementPayload::AudioChunk { data, mime_type }) => {
                let session = self.ensure_session(ctx, &element).await?;
                session.send_audio(AudioFrame::new(data.clone(), mime_type.clone())).await?;

                if let Some(frame) = session.recv_audio().await? {
                    let mut reply = element.clone();
                    reply.payload = Some(ElementPayload::AudioChunk {
                        data: frame.data,
                        mime_type: frame.mime_type,
                    });
                    if out.send(reply).await.is_err() {
                        return Err(Error::Cancelled);
                    }
                }
                Ok(())
            }
            Some(ElementPayload::Control { marker: ControlMarker::End }) => {
                if let Some(session) = self.session.lock().clone() {
                    session.close().await?;
                }
                if out.send(element).await.is_err() {
                    return Err(Error::Cancelled);
                }
                Ok(())
            }
            _ => {
                if out.send(element).await.is_err() {
                    return Err(Error::Cancelled);
                }
                Ok(())
            }
        }
    }
}
