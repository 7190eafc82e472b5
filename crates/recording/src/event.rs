//! The JSON-lines event vocabulary a session recording is made of (§4.5,
//! §6). Every recorded run writes a metadata line followed by a sequence
//! of these events, one per line.

use chrono::{DateTime, Utc};
use conductor_domain::message::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordingEvent {
    #[serde(rename = "conversation.started")]
    ConversationStarted {
        timestamp: DateTime<Utc>,
        conversation_id: String,
    },

    #[serde(rename = "message.created")]
    MessageCreated {
        timestamp: DateTime<Utc>,
        message: Message,
    },

    #[serde(rename = "audio.input")]
    AudioInput {
        timestamp: DateTime<Utc>,
        data: String,
        mime_type: String,
        index: u32,
    },

    #[serde(rename = "audio.output")]
    AudioOutput {
        timestamp: DateTime<Utc>,
        data: String,
        mime_type: String,
        index: u32,
    },

    #[serde(rename = "provider.call.started")]
    ProviderCallStarted {
        timestamp: DateTime<Utc>,
        provider_id: String,
    },

    #[serde(rename = "provider.call.completed")]
    ProviderCallCompleted {
        timestamp: DateTime<Utc>,
        provider_id: String,
        input_tokens: u32,
        output_tokens: u32,
        cost: f64,
    },

    #[serde(rename = "tool.call.started")]
    ToolCallStarted {
        timestamp: DateTime<Utc>,
        call_id: String,
        tool_name: String,
    },

    #[serde(rename = "tool.call.completed")]
    ToolCallCompleted {
        timestamp: DateTime<Utc>,
        call_id: String,
        tool_name: String,
        is_error: bool,
    },

    #[serde(rename = "validation.evaluated")]
    ValidationEvaluated {
        timestamp: DateTime<Utc>,
        assertion_type: String,
        passed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl RecordingEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RecordingEvent::ConversationStarted { timestamp, .. }
            | RecordingEvent::MessageCreated { timestamp, .. }
            | RecordingEvent::AudioInput { timestamp, .. }
            | RecordingEvent::AudioOutput { timestamp, .. }
            | RecordingEvent::ProviderCallStarted { timestamp, .. }
            | RecordingEvent::ProviderCallCompleted { timestamp, .. }
            | RecordingEvent::ToolCallStarted { timestamp, .. }
            | RecordingEvent::ToolCallCompleted { timestamp, .. }
            | RecordingEvent::ValidationEvaluated { timestamp, .. } => *timestamp,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RecordingEvent::ConversationStarted { .. } => "conversation.started",
            RecordingEvent::MessageCreated { .. } => "message.created",
            RecordingEvent::AudioInput { .. } => "audio.input",
            RecordingEvent::AudioOutput { .. } => "audio.output",
            RecordingEvent::ProviderCallStarted { .. } => "provider.call.started",
            RecordingEvent::ProviderCallCompleted { .. } => "provider.call.completed",
            RecordingEvent::ToolCallStarted { .. } => "tool.call.started",
            RecordingEvent::ToolCallCompleted { .. } => "tool.call.completed",
            RecordingEvent::ValidationEvaluated { .. } => "validation.evaluated",
        }
    }
}
