//! Transcript adapter (§4.6): reads human-authored YAML transcripts with
//! messages, tool calls, and multimodal parts — used for recorded
//! evaluation workflows where the conversation was never produced by a
//! live run.

use std::path::Path;

use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;
use conductor_domain::recording::{RecordingFormat, RecordingMetadata, RecordingRef};
use serde::Deserialize;

use super::{LoadedRecording, RecordingAdapter};

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    messages: Vec<Message>,
}

pub struct TranscriptAdapter;

#[async_trait::async_trait]
impl RecordingAdapter for TranscriptAdapter {
    fn format(&self) -> RecordingFormat {
        RecordingFormat::Transcript
    }

    fn can_handle(&self, source: &str, type_hint: Option<RecordingFormat>) -> bool {
        matches!(type_hint, Some(RecordingFormat::Transcript)) || source.ends_with(".yaml") || source.ends_with(".yml")
    }

    async fn enumerate(&self, source: &str) -> Result<Vec<RecordingRef>> {
        let path = Path::new(source);
        if path.is_dir() {
            let mut refs = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await.map_err(Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let entry_path = entry.path();
                let is_yaml = matches!(
                    entry_path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                );
                if is_yaml {
                    refs.push(RecordingRef {
                        source: source.to_string(),
                        id: entry_path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
                        type_hint: Some(RecordingFormat::Transcript),
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
                type_hint: Some(RecordingFormat::Transcript),
                sub_index: None,
            }])
        }
    }

    async fn load(&self, reference: &RecordingRef) -> Result<LoadedRecording> {
        let path = Path::new(&reference.source);
        let full_path = if path.is_dir() { path.join(&reference.id) } else { path.to_path_buf() };
        let content = tokio::fs::read_to_string(&full_path).await.map_err(Error::Io)?;
        let parsed: TranscriptFile =
            serde_yaml::from_str(&content).map_err(|e| Error::Other(format!("invalid transcript YAML: {e}")))?;

        let mut metadata = RecordingMetadata::default();
        metadata.session_id = parsed.session_id;
        metadata.tags = parsed.tags;

        Ok(LoadedRecording { messages: parsed.messages, metadata })
    }
}
