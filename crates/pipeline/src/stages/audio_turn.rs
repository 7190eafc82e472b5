use async_trait::async_trait;
use parking_lot::Mutex;

use conductor_domain::audio::AudioFrame;
use conductor_domain::conversation::{ElementPayload, StreamElement};
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};

/// First link of the VAD stage chain (§4.1 step 6): accumulates audio
/// chunks, feeding each one to the run's `TurnDetector`, until it signals
/// a user turn boundary. Streaming-only — a stage between
/// `STTStage`/`ProviderStage`/`TTSStage` and whatever upstream source
/// produces `ElementPayload::AudioChunk` elements.
#[derive(Default)]
pub struct AudioTurnStage {
    buffer: Mutex<Vec<AudioFrame>>,
}

impl AudioTurnStage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Stage for AudioTurnStage {
    fn name(&self) -> &str {
        "audio_turn"
    }

    async fn process(&self, element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let Some(ElementPayload::AudioChunk { data, mime_type }) = &element.payload else {
            return Ok(vec![element]);
        };
        let frame = AudioFrame::new(data.clone(), mime_type.clone());
        let boundary = ctx
            .services
            .turn_detector
            .as_ref()
            .map(|d| d.push(&frame))
            .unwrap_or(false);
        self.buffer.lock().push(frame);

        if !boundary {
            return Ok(Vec::new());
        }

        let frames = std::mem::take(&mut *self.buffer.lock());
        if let Some(detector) = &ctx.services.turn_detector {
            detector.reset();
        }

        let mut out = element;
        out.payload = None;
        out.metadata.insert(
            keys::ACCUMULATED_AUDIO.into(),
            serde_json::to_value(&frames).unwrap_or(serde_json::Value::Null),
        );
        Ok(vec![out])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::audio_mock::MockTurnDetector;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    fn ctx_with_detector(chunks_per_turn: usize) -> StageContext {
        let services = PipelineServices::new(
            Arc::new(ProviderRegistry::new()),
            Arc::new(ToolRegistry::new()),
            Arc::new(ValidatorRegistry::new()),
            PromptRegistryConfig::default(),
            ContextBudgetConfig::default(),
        )
        .with_turn_detector(Arc::new(MockTurnDetector::new(chunks_per_turn)));

        StageContext {
            run: RunContext {
                run_id: "r1".into(),
                conversation_id: "c1".into(),
                task_type: "default".into(),
                provider_id: "p1".into(),
                tool_policy: ToolPolicy::default(),
                suppress_validation: false,
            },
            cancel: CancelToken::new(),
            services: Arc::new(services),
        }
    }

    fn audio_element() -> StreamElement {
        let mut element = StreamElement::new();
        element.payload = Some(ElementPayload::AudioChunk {
            data: "chunk".into(),
            mime_type: "audio/wav".into(),
        });
        element
    }

    #[tokio::test]
    async fn buffers_until_the_turn_detector_signals_a_boundary() {
        let stage = AudioTurnStage::new();
        let ctx = ctx_with_detector(2);

        let out = stage.process(audio_element(), &ctx).await.unwrap();
        assert!(out.is_empty(), "no output before the boundary");

        let out = stage.process(audio_element(), &ctx).await.unwrap();
        assert_eq!(out.len(), 1);
        let frames: Vec<AudioFrame> =
            serde_json::from_value(out[0].metadata.get(keys::ACCUMULATED_AUDIO).unwrap().clone()).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[tokio::test]
    async fn non_audio_elements_pass_through_untouched() {
        let stage = AudioTurnStage::new();
        let ctx = ctx_with_detector(1);
        let element = StreamElement::new();
        let out = stage.process(element, &ctx).await.unwrap();
        assert_eq!(out.len(), 1);
    }
}
