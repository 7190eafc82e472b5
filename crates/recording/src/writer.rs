//! Session recording writer (§4.5, §6). Buffers events for a single run
//! and flushes a JSON-lines file on [`SessionRecorder::finish`]: one
//! metadata line, then one line per recorded event, in order.

use std::path::Path;

use chrono::{DateTime, Utc};
use conductor_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::event::RecordingEvent;

/// The first line of a session recording file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadataLine {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub event_count: usize,
    #[serde(default)]
    pub extras: HashMap<String, Value>,
}

/// Accumulates events for one run's recording. `finish` is the only way
/// to materialize the file, since the metadata line needs the final
/// duration and event count that only exist once the run is done.
pub struct SessionRecorder {
    session_id: String,
    provider_id: Option<String>,
    model: Option<String>,
    tags: Vec<String>,
    start_time: DateTime<Utc>,
    events: Vec<RecordingEvent>,
}

impl SessionRecorder {
    pub fn new(session_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            provider_id: None,
            model: None,
            tags: Vec::new(),
            start_time,
            events: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>, model: Option<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self.model = model;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn record(&mut self, event: RecordingEvent) {
        self.events.push(event);
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Write the metadata line and every recorded event to `path`,
    /// returning the metadata line written.
    pub async fn finish(self, path: &Path, end_time: DateTime<Utc>) -> Result<SessionMetadataLine> {
        let metadata = SessionMetadataLine {
            session_id: self.session_id,
            provider_id: self.provider_id,
            model: self.model,
            tags: self.tags,
            start_time: self.start_time,
            duration_ms: (end_time - self.start_time).num_milliseconds().max(0),
            event_count: self.events.len(),
            extras: HashMap::new(),
        };

        let mut out = String::new();
        out.push_str(&serde_json::to_string(&metadata)?);
        out.push('\n');
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        tokio::fs::write(path, out).await.map_err(Error::Io)?;

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingEvent;
    use conductor_domain::message::Message;

    #[tokio::test]
    async fn finish_writes_metadata_line_then_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");

        let start = Utc::now();
        let mut recorder = SessionRecorder::new("s1", start).with_provider("mock-1", Some("test-model".into()));
        recorder.record(RecordingEvent::ConversationStarted {
            timestamp: start,
            conversation_id: "c1".into(),
        });
        recorder.record(RecordingEvent::MessageCreated {
            timestamp: start,
            message: Message::user("hi"),
        });

        let end = start + chrono::Duration::milliseconds(50);
        let metadata = recorder.finish(&path, end).await.unwrap();
        assert_eq!(metadata.event_count, 2);
        assert_eq!(metadata.duration_ms, 50);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: SessionMetadataLine = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.session_id, "s1");
    }
}
