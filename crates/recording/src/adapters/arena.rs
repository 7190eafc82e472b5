//! Arena-output adapter (§4.6): reads compiled test-run outputs, either a
//! list of turn records (`user` → `assistant` → tool-result sequences)
//! or the simplified `{"Messages": […], "RunID": …}` form.

use std::path::Path;

use conductor_domain::error::{Error, Result};
use conductor_domain::message::{Message, ToolCall};
use conductor_domain::recording::{RecordingFormat, RecordingMetadata, RecordingRef};
use serde::Deserialize;

use super::{LoadedRecording, RecordingAdapter};

pub struct ArenaOutputAdapter;

/// One turn in the verbose arena form: a user prompt, the assistant's
/// reply, any tool calls it made, and the results those calls produced.
#[derive(Debug, Deserialize)]
struct ArenaTurn {
    user: Option<String>,
    assistant: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ArenaToolCall>,
    #[serde(default)]
    tool_results: Vec<ArenaToolResult>,
}

#[derive(Debug, Deserialize)]
struct ArenaToolCall {
    id: String,
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ArenaToolResult {
    reply_to: String,
    content: String,
    #[serde(default)]
    is_error: bool,
}

/// The simplified form: messages already in canonical shape, tagged with
/// a run id.
#[derive(Debug, Deserialize)]
struct SimplifiedArenaOutput {
    #[serde(rename = "Messages")]
    messages: Vec<Message>,
    #[serde(rename = "RunID")]
    run_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArenaFile {
    Simplified(SimplifiedArenaOutput),
    Turns(Vec<ArenaTurn>),
}

fn turns_to_messages(turns: Vec<ArenaTurn>) -> Vec<Message> {
    let mut messages = Vec::new();
    for turn in turns {
        if let Some(user_text) = turn.user {
            messages.push(Message::user(user_text));
        }
        if turn.assistant.is_some() || !turn.tool_calls.is_empty() {
            let mut msg = turn
                .assistant
                .map(Message::assistant)
                .unwrap_or_else(|| Message::assistant(""));
            if !turn.tool_calls.is_empty() {
                msg.tool_calls = Some(
                    turn.tool_calls
                        .into_iter()
                        .map(|c| ToolCall { id: c.id, name: c.name, arguments: c.arguments })
                        .collect(),
                );
            }
            messages.push(msg);
        }
        for result in turn.tool_results {
            messages.push(if result.is_error {
                Message::tool_error(result.reply_to, result.content)
            } else {
                Message::tool_result(result.reply_to, result.content)
            });
        }
    }
    messages
}

#[async_trait::async_trait]
impl RecordingAdapter for ArenaOutputAdapter {
    fn format(&self) -> RecordingFormat {
        RecordingFormat::ArenaOutput
    }

    fn can_handle(&self, source: &str, type_hint: Option<RecordingFormat>) -> bool {
        matches!(type_hint, Some(RecordingFormat::ArenaOutput)) || source.ends_with(".json")
    }

    async fn enumerate(&self, source: &str) -> Result<Vec<RecordingRef>> {
        let path = Path::new(source);
        if path.is_dir() {
            let mut refs = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await.map_err(Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let entry_path = entry.path();
                if entry_path.extension().and_then(|e| e.to_str()) == Some("json") {
                    refs.push(RecordingRef {
                        source: source.to_string(),
                        id: entry_path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
                        type_hint: Some(RecordingFormat::ArenaOutput),
                        sub_index: None,
                    });
                }
            }
            refs.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(refs)
        } else {
            Ok(vec![RecordingRef {
                source: source.to_string(),
                id: path.file_name().and_then(|n| n.to_str()).unwrap_or(source).to_string(),
                type_hint: Some(RecordingFormat::ArenaOutput),
                sub_index: None,
            }])
        }
    }

    async fn load(&self, reference: &RecordingRef) -> Result<LoadedRecording> {
        let path = Path::new(&reference.source);
        let full_path = if path.is_dir() { path.join(&reference.id) } else { path.to_path_buf() };
        let content = tokio::fs::read_to_string(&full_path).await.map_err(Error::Io)?;
        let parsed: ArenaFile = serde_json::from_str(&content)?;

        let (messages, run_id) = match parsed {
            ArenaFile::Simplified(simplified) => (simplified.messages, Some(simplified.run_id)),
            ArenaFile::Turns(turns) => (turns_to_messages(turns), None),
        };

        let mut metadata = RecordingMetadata::default();
        metadata.session_id = run_id;

        Ok(LoadedRecording { messages, metadata })
    }
}
