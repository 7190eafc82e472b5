use crate::message::{Message, ToolCall};
use crate::run::CostInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of one conversation, keyed by a stable conversation id.
///
/// Invariants: message order is insertion order; the state store
/// guarantees serialized reads of a given id; concurrent writes under the
/// same id require external synchronization (each run owns a distinct id,
/// so the engine never needs to arbitrate two writers itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub token_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ConversationState {
    pub fn new(conversation_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            token_count: 0,
            created_at,
            metadata: HashMap::new(),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// A discriminated payload riding on a `StreamElement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementPayload {
    TextChunk { text: String },
    AudioChunk { data: String, mime_type: String },
    ToolCallEvent { call: ToolCall },
    Control { marker: ControlMarker },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMarker {
    Start,
    TurnBoundary,
    Flush,
    Cancel,
    End,
}

/// The unit of dataflow between pipeline stages. Elements flow forward in
/// declared stage order; a stage may transform, buffer, or emit 0..N
/// elements per input it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ElementPayload>,
}

impl StreamElement {
    pub fn new() -> Self {
        Self {
            message: None,
            metadata: HashMap::new(),
            payload: None,
        }
    }

    pub fn with_message(message: Message) -> Self {
        Self {
            message: Some(message),
            metadata: HashMap::new(),
            payload: None,
        }
    }
}

impl Default for StreamElement {
    fn default() -> Self {
        Self::new()
    }
}

/// The assistant's final reply for a turn, with optional cost accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostInfo>,
}

/// Synchronous-mode input to a pipeline run: messages plus metadata in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            metadata: HashMap::new(),
        }
    }
}

/// Synchronous-mode output from a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub response: Response,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
