use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Points at a recording without committing to which adapter will load it.
/// `type_hint` lets a caller skip the registry's `CanHandle` probing when
/// the format is already known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingRef {
    pub source: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<RecordingFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingFormat {
    Session,
    ArenaOutput,
    Transcript,
}

/// A named judge target recorded alongside a transcript (`name -> provider spec`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeTarget {
    #[serde(rename = "type")]
    pub provider_type: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Metadata attached to a loaded recording, independent of which adapter
/// produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub judge_targets: HashMap<String, JudgeTarget>,
    #[serde(default)]
    pub per_turn_timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub total_duration_ms: i64,
    #[serde(default)]
    pub provider_info: ProviderInfo,
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

/// A time range within a recording, in seconds from the recording start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_s: f64,
    pub end_s: f64,
}

/// A score or comment keyed to a session, a time range, or a specific
/// event — a first-class sidecar to recordings rather than a field on
/// `RecordingMetadata`, so annotations can be authored and loaded
/// independently of the run that produced the recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_ref_round_trips_without_type_hint() {
        let r = RecordingRef {
            source: "./recordings".into(),
            id: "run-1.jsonl".into(),
            type_hint: None,
            sub_index: None,
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: RecordingRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "run-1.jsonl");
    }

    #[test]
    fn annotation_defaults_are_all_none() {
        let json = r#"{"session_id": "s1"}"#;
        let a: Annotation = serde_json::from_str(json).unwrap();
        assert!(a.time_range.is_none());
        assert!(a.score.is_none());
    }
}
