use async_trait::async_trait;

use conductor_domain::audio::AudioFrame;
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;

use crate::stage::{keys, Stage, StageContext};

/// Second link of the VAD stage chain (§4.1 step 6): transcribes the
/// audio `AudioTurnStage` accumulated for one user turn and appends it
/// to the conversation state as a user message, the same way the
/// executor's turn input feeds a text pipeline (§4.2 step 3) — so
/// `ProviderStage` downstream needs no audio-specific branch.
pub struct STTStage;

#[async_trait]
impl Stage for STTStage {
    fn name(&self) -> &str {
        "stt"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let stt = ctx
            .services
            .stt
            .as_ref()
            .ok_or_else(|| Error::Config("stt stage requires services.stt to be configured".into()))?;

        let frames: Vec<AudioFrame> = element
            .metadata
            .get(keys::ACCUMULATED_AUDIO)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let transcript = stt.transcribe(&frames).await?;

        let mut state: ConversationState = element
            .metadata
            .get(keys::CONVERSATION_STATE)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_else(|| ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now()));
        state.append(Message::user(transcript));

        element.metadata.remove(keys::ACCUMULATED_AUDIO);
        element.metadata.insert(
            keys::CONVERSATION_STATE.into(),
            serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
        );
        Ok(vec![element])
    }
}
