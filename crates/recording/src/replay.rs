//! Replay player (§4.5): loads a session recording and exposes per-track
//! timelines (user audio, assistant audio, messages, tool calls), seek,
//! and WAV export. [`responses_for_replay`] extracts the assistant turns
//! as a queue a [`conductor_providers::ReplayProvider`] can answer
//! `Predict` calls from, in order.

use std::path::Path;

use base64::Engine;
use conductor_domain::error::{Error, Result};
use conductor_domain::message::{Message, Role};
use conductor_providers::ChatResponse;

use crate::event::RecordingEvent;
use crate::writer::SessionMetadataLine;

/// Which audio track to read or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTrack {
    UserInput,
    AssistantOutput,
}

pub struct ReplayPlayer {
    pub metadata: SessionMetadataLine,
    pub events: Vec<RecordingEvent>,
}

impl ReplayPlayer {
    /// Parse a recording file written by [`crate::writer::SessionRecorder`]:
    /// first line metadata, remaining lines events.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(Error::Io)?;
        let mut lines = content.lines();
        let metadata_line = lines
            .next()
            .ok_or_else(|| Error::Other(format!("recording \"{}\" is empty", path.display())))?;
        let metadata: SessionMetadataLine = serde_json::from_str(metadata_line)?;

        let mut events = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str::<RecordingEvent>(line)?);
        }

        Ok(Self { metadata, events })
    }

    /// Every message, in recorded order (§8 invariant 6: reloading a
    /// recording must reproduce the same message sequence the live run
    /// observed).
    pub fn messages(&self) -> Vec<Message> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordingEvent::MessageCreated { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_call_events(&self) -> Vec<&RecordingEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, RecordingEvent::ToolCallStarted { .. } | RecordingEvent::ToolCallCompleted { .. }))
            .collect()
    }

    fn audio_events(&self, track: AudioTrack) -> Vec<&RecordingEvent> {
        self.events
            .iter()
            .filter(|e| match (track, e) {
                (AudioTrack::UserInput, RecordingEvent::AudioInput { .. }) => true,
                (AudioTrack::AssistantOutput, RecordingEvent::AudioOutput { .. }) => true,
                _ => false,
            })
            .collect()
    }

    /// The first event at or after `offset_s` seconds from the recording
    /// start, across all event kinds — the seek primitive a UI timeline
    /// would build on.
    pub fn seek(&self, offset_s: f64) -> Option<&RecordingEvent> {
        let target = self.metadata.start_time + chrono::Duration::milliseconds((offset_s * 1000.0) as i64);
        self.events.iter().find(|e| e.timestamp() >= target)
    }

    /// Decode a track's base64 audio chunks, in index order, concatenated
    /// into raw bytes, and wrap them in a minimal WAV container. Chunks
    /// are assumed to be raw 16-bit PCM at `sample_rate_hz` — the
    /// recording format does not carry a sample rate itself, so the
    /// caller (the stage that originally captured the audio) supplies it.
    pub fn export_wav(&self, track: AudioTrack, sample_rate_hz: u32, out_path: &Path) -> Result<()> {
        let mut chunks: Vec<(u32, Vec<u8>)> = Vec::new();
        for event in self.audio_events(track) {
            let (data, index) = match event {
                RecordingEvent::AudioInput { data, index, .. } => (data, *index),
                RecordingEvent::AudioOutput { data, index, .. } => (data, *index),
                _ => continue,
            };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| Error::Other(format!("invalid base64 audio chunk: {e}")))?;
            chunks.push((index, bytes));
        }
        chunks.sort_by_key(|(index, _)| *index);
        let pcm: Vec<u8> = chunks.into_iter().flat_map(|(_, bytes)| bytes).collect();

        let wav = build_wav(&pcm, sample_rate_hz, 1, 16);
        std::fs::write(out_path, wav).map_err(Error::Io)?;
        Ok(())
    }
}

/// Wrap raw PCM bytes in a minimal canonical WAV (RIFF/fmt/data) header.
fn build_wav(pcm: &[u8], sample_rate_hz: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate_hz * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_len = pcm.len() as u32;
    let riff_len = 36 + data_len;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Turn a loaded recording's assistant turns into a response queue, in
/// order, for a [`conductor_providers::ReplayProvider`] to answer
/// `Predict` calls from deterministically.
pub fn responses_for_replay(player: &ReplayPlayer) -> Vec<ChatResponse> {
    player
        .messages()
        .into_iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| ChatResponse {
            content: m.all_text(),
            tool_calls: m.tool_calls.unwrap_or_default(),
            usage: None,
            model: player.metadata.model.clone().unwrap_or_else(|| "replay".to_string()),
            finish_reason: Some("stop".into()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SessionRecorder;
    use chrono::Utc;

    #[tokio::test]
    async fn load_round_trips_message_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let start = Utc::now();
        let mut recorder = SessionRecorder::new("s1", start);
        recorder.record(RecordingEvent::MessageCreated { timestamp: start, message: Message::user("hi") });
        recorder.record(RecordingEvent::MessageCreated {
            timestamp: start,
            message: Message::assistant("hello back"),
        });
        recorder.finish(&path, start).await.unwrap();

        let player = ReplayPlayer::load(&path).await.unwrap();
        let messages = player.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text_content(), Some("hi"));
        assert_eq!(messages[1].text_content(), Some("hello back"));
    }

    #[test]
    fn wav_header_has_correct_riff_length() {
        let pcm = vec![0u8; 100];
        let wav = build_wav(&pcm, 16_000, 1, 16);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        let riff_len = u32::from_le_bytes(wav[4..8].try_into().unwrap());
        assert_eq!(riff_len, 36 + 100);
    }

    #[tokio::test]
    async fn responses_for_replay_extracts_assistant_turns_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let start = Utc::now();
        let mut recorder = SessionRecorder::new("s1", start);
        recorder.record(RecordingEvent::MessageCreated { timestamp: start, message: Message::user("hi") });
        recorder.record(RecordingEvent::MessageCreated { timestamp: start, message: Message::assistant("ok") });
        recorder.finish(&path, start).await.unwrap();

        let player = ReplayPlayer::load(&path).await.unwrap();
        let responses = responses_for_replay(&player);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].content, "ok");
    }
}
