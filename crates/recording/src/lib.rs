//! Session recording, replay, and the pluggable recording-adapter layer
//! (§4.5, §4.6, §6): writing a run's events to JSONL, loading them back
//! for replay or export, and reading conversations captured in external
//! formats (arena output, human-authored transcripts) into the same
//! canonical shape.

pub mod adapters;
pub mod annotations;
pub mod event;
pub mod replay;
pub mod writer;

pub use adapters::{AdapterRegistry, LoadedRecording, RecordingAdapter};
pub use annotations::AnnotationStore;
pub use event::RecordingEvent;
pub use replay::{responses_for_replay, AudioTrack, ReplayPlayer};
pub use writer::{SessionMetadataLine, SessionRecorder};
