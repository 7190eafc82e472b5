use async_trait::async_trait;

use conductor_domain::conversation::{ConversationState, ControlMarker, ElementPayload, StreamElement};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::Role;

use crate::stage::{keys, Stage, StageContext};

/// Last link of the VAD stage chain (§4.1 step 6): synthesizes
/// `ProviderStage`'s reply into audio output, one output element per
/// synthesized frame. Checks the shared `TurnDetector` for barge-in
/// before synthesizing — if the user has already started talking again,
/// output is replaced with a single cancel marker instead, so an
/// upstream playback driver stops immediately rather than finishing a
/// reply nobody is listening to.
pub struct TTSStage;

#[async_trait]
impl Stage for TTSStage {
    fn name(&self) -> &str {
        "tts"
    }

    async fn process(&self, element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;

        if ctx.services.turn_detector.as_ref().map(|d| d.should_interrupt()).unwrap_or(false) {
            let mut out = element;
            out.payload = Some(ElementPayload::Control { marker: ControlMarker::Cancel });
            return Ok(vec![out]);
        }

        let tts = ctx
            .services
            .tts
            .as_ref()
            .ok_or_else(|| Error::Config("tts stage requires services.tts to be configured".into()))?;

        let raw_state = element.metadata.get(keys::CONVERSATION_STATE).cloned().ok_or_else(|| {
            Error::Config("tts stage requires metadata[conversation_state] to be populated".into())
        })?;
        let state: ConversationState = serde_json::from_value(raw_state)?;
        let text = state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .and_then(|m| m.text_content())
            .unwrap_or_default();

        let frames = tts.synthesize(text).await?;
        let outputs = frames
            .into_iter()
            .map(|frame| {
                let mut out = element.clone();
                out.payload = Some(ElementPayload::AudioChunk {
                    data: frame.data,
                    mime_type: frame.mime_type,
                });
                out
            })
            .collect();
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::services::PipelineServices;
    use crate::stage::RunContext;
    use chrono::Utc;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::config::{ContextBudgetConfig, PromptRegistryConfig};
    use conductor_domain::message::Message;
    use conductor_domain::scenario::ToolPolicy;
    use conductor_providers::audio_mock::{MockTtsService, MockTurnDetector};
    use conductor_providers::registry::ProviderRegistry;
    use conductor_tools::ToolRegistry;
    use std::sync::Arc;

    fn element_with_reply(text: &str) -> StreamElement {
        let mut state = ConversationState::new("c1", Utc::now());
        state.append(Message::assistant(text));
        let mut element = StreamElement::new();
        element
            .metadata
            .insert(keys::CONVERSATION_STATE.into(), serde_json::to_value(&state).unwrap());
        element
    }

    fn services_with(tts: Arc<MockTtsService>, detector: Option<Arc<MockTurnDetector>>) -> Arc<PipelineServices> {
        let mut services = PipelineServices::new(
            Arc::new(ProviderRegistry::new()),
            Arc::new(ToolRegistry::new()),
            Arc::new(ValidatorRegistry::new()),
            PromptRegistryConfig::default(),
            ContextBudgetConfig::default(),
        )
        .with_tts(tts);
        if let Some(d) = detector {
            services = services.with_turn_detector(d);
        }
        Arc::new(services)
    }

    fn ctx(services: Arc<PipelineServices>) -> StageContext {
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
            services,
        }
    }

    #[tokio::test]
    async fn synthesizes_the_last_assistant_message() {
        let services = services_with(Arc::new(MockTtsService::new("audio/wav")), None);
        let stage = TTSStage;
        let out = stage.process(element_with_reply("hi there"), &ctx(services)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0].payload, Some(ElementPayload::AudioChunk { data, .. }) if data == "synth:hi there"));
    }

    #[tokio::test]
    async fn barge_in_replaces_output_with_a_cancel_marker() {
        let detector = Arc::new(MockTurnDetector::new(1));
        detector.interrupt_next();
        let services = services_with(Arc::new(MockTtsService::new("audio/wav")), Some(detector));
        let stage = TTSStage;
        let out = stage.process(element_with_reply("hi there"), &ctx(services)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0].payload,
            Some(ElementPayload::Control { marker: ControlMarker::Cancel })
        ));
    }
}
