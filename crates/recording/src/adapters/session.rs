//! Session-recording adapter (§4.6): reads the engine's own JSONL format,
//! filtering to message events and rebuilding messages — including
//! multimodal parts, tool calls, and tool results — in recorded order.

use conductor_domain::error::Result;
use conductor_domain::recording::{JudgeTarget, ProviderInfo, RecordingFormat, RecordingMetadata, RecordingRef};
use std::path::Path;

use super::{LoadedRecording, RecordingAdapter};
use crate::event::RecordingEvent;
use crate::replay::ReplayPlayer;

pub struct SessionAdapter;

#[async_trait::async_trait]
impl RecordingAdapter for SessionAdapter {
    fn format(&self) -> RecordingFormat {
        RecordingFormat::Session
    }

    fn can_handle(&self, source: &str, type_hint: Option<RecordingFormat>) -> bool {
        matches!(type_hint, Some(RecordingFormat::Session)) || source.ends_with(".jsonl")
    }

    /// A session source is always a single file — `Enumerate` expands a
    /// directory of `*.jsonl` files into one reference per file.
    async fn enumerate(&self, source: &str) -> Result<Vec<RecordingRef>> {
        let path = Path::new(source);
        if path.is_dir() {
            let mut refs = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await.map_err(conductor_domain::error::Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(conductor_domain::error::Error::Io)? {
                let entry_path = entry.path();
                if entry_path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                    refs.push(RecordingRef {
                        source: source.to_string(),
                        id: entry_path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or_default()
                            .to_string(),
                        type_hint: Some(RecordingFormat::Session),
                        sub_index: None,
                    });
                }
            }
            refs.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(refs)
        } else {
            Ok(vec![RecordingRef {
                source: source.to_string(),
                id: path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(source)
                    .to_string(),
                type_hint: Some(RecordingFormat::Session),
                sub_index: None,
            }])
        }
    }

    async fn load(&self, reference: &RecordingRef) -> Result<LoadedRecording> {
        let path = Path::new(&reference.source);
        let full_path = if path.is_dir() { path.join(&reference.id) } else { path.to_path_buf() };

        let player = ReplayPlayer::load(&full_path).await?;
        let messages = player.messages();

        let per_turn_timestamps = player
            .events
            .iter()
            .filter(|e| matches!(e, RecordingEvent::MessageCreated { .. }))
            .map(|e| e.timestamp())
            .collect();

        let mut judge_targets = std::collections::HashMap::new();
        if let Some(model) = &player.metadata.model {
            if let Some(provider_id) = &player.metadata.provider_id {
                judge_targets.insert(
                    "default".to_string(),
                    JudgeTarget {
                        provider_type: provider_id.clone(),
                        model: model.clone(),
                        id: Some(provider_id.clone()),
                    },
                );
            }
        }

        let metadata = RecordingMetadata {
            session_id: Some(player.metadata.session_id.clone()),
            judge_targets,
            per_turn_timestamps,
            tags: player.metadata.tags.clone(),
            total_duration_ms: player.metadata.duration_ms,
            provider_info: ProviderInfo {
                provider_id: player.metadata.provider_id.clone(),
                model: player.metadata.model.clone(),
            },
            extras: player.metadata.extras.clone(),
        };

        Ok(LoadedRecording { messages, metadata })
    }
}
