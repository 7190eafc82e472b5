use serde::{Deserialize, Serialize};

/// A conversational turn. Immutable once appended to `ConversationState`.
///
/// `content` carries the plain-text view (when the turn is pure text);
/// `parts` carries the ordered multimodal breakdown. A message is free to
/// populate both — providers that only understand flat text can read
/// `content` (or `MessageContent::text()` via `content_text()`), while
/// multimodal-aware stages walk `parts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One piece of a multimodal message. Media is carried either inline
/// (base64), by URL, or by filesystem path — never all three.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        media: MediaRef,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimensions: Option<Dimensions>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_kb: Option<f64>,
    },
    Audio {
        media: MediaRef,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_s: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_kb: Option<f64>,
    },
    Video {
        media: MediaRef,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimensions: Option<Dimensions>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_s: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_kb: Option<f64>,
    },
    Document {
        media: MediaRef,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_kb: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaRef {
    Base64 { data: String },
    Url { url: String },
    Path { path: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A model-issued tool call: id, name, and the raw JSON argument blob the
/// tool executor is responsible for decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result of executing a tool call, carried back as its own message.
/// Formatting this for a specific provider's wire convention is adapter
/// territory — the engine only ever moves this structured form around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub reply_to: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    pub fn tool_result(reply_to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: None,
            parts: Vec::new(),
            tool_calls: None,
            tool_result: Some(ToolResult {
                reply_to: reply_to.into(),
                content: content.into(),
                is_error: false,
            }),
        }
    }

    /// A tool-result message flagged as an error (§7: the executor failed,
    /// but the loop continues — the failure is surfaced to the model as a
    /// normal tool-role turn rather than aborting the run).
    pub fn tool_error(reply_to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: None,
            parts: Vec::new(),
            tool_calls: None,
            tool_result: Some(ToolResult {
                reply_to: reply_to.into(),
                content: content.into(),
                is_error: true,
            }),
        }
    }

    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            parts: Vec::new(),
            tool_calls: None,
            tool_result: None,
        }
    }

    /// The plain-text view of this message: `content` if set, else the
    /// first `Text` part, else `None`.
    pub fn text_content(&self) -> Option<&str> {
        if let Some(c) = &self.content {
            return Some(c.as_str());
        }
        self.parts.iter().find_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Joins every `Text` part (and `content`, if set) with `"\n"`.
    pub fn all_text(&self) -> String {
        let mut chunks: Vec<&str> = Vec::new();
        if let Some(c) = &self.content {
            chunks.push(c.as_str());
        }
        for p in &self.parts {
            if let ContentPart::Text { text } = p {
                chunks.push(text.as_str());
            }
        }
        chunks.join("\n")
    }
}
