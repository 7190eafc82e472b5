//! Abstract audio-service seams consumed by the VAD stage chain and
//! `DuplexProviderStage` (§4.1 step 6). Concrete STT/TTS/VAD backends and
//! vendor duplex-audio wiring are out of scope (§1); these traits are the
//! same kind of seam [`crate::traits::Provider`] is for text completion —
//! the engine builds the stages against them and a caller supplies a real
//! implementation at startup.

use async_trait::async_trait;

use conductor_domain::audio::AudioFrame;
use conductor_domain::error::Result;

/// Speech-to-text: turns a turn's worth of accumulated audio into a
/// transcript.
#[async_trait]
pub trait SttService: Send + Sync {
    async fn transcribe(&self, audio: &[AudioFrame]) -> Result<String>;
}

/// Text-to-speech: synthesizes a textual reply into audio chunks.
#[async_trait]
pub trait TtsService: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<AudioFrame>>;
}

/// Voice-activity + turn-boundary detection, shared by `AudioTurnStage`
/// (to decide when the user has finished speaking) and `TTSStage` (to
/// decide when new input audio should interrupt in-flight output —
/// barge-in, §4.1 step 6).
pub trait TurnDetector: Send + Sync {
    /// Feed one chunk of input audio. Returns `true` once this chunk
    /// completes a user turn (voiced audio followed by enough silence).
    fn push(&self, chunk: &AudioFrame) -> bool;

    /// True when voiced input has arrived while output is still playing
    /// out — the caller should stop TTS playback and start listening.
    fn should_interrupt(&self) -> bool;

    /// Drop any buffered audio and interruption state, ready for the next
    /// turn.
    fn reset(&self);
}

/// A live bidirectional session against a provider's native audio mode.
/// Distinct from a [`crate::traits::Provider`] call: a duplex session is
/// stateful and scoped to one conversation for as long as it stays open,
/// not one request/response round trip.
#[async_trait]
pub trait DuplexSession: Send + Sync {
    async fn send_audio(&self, chunk: AudioFrame) -> Result<()>;

    /// Waits for the next chunk of provider-generated audio. `Ok(None)`
    /// means the provider closed the session.
    async fn recv_audio(&self) -> Result<Option<AudioFrame>>;

    async fn close(&self) -> Result<()>;
}

/// A provider that can open a duplex audio session. Providers without
/// native audio simply don't implement this trait; a scenario that
/// requires `Capability::Audio` against one never reaches
/// `DuplexProviderStage` (§8 invariant 3 gates it out at planning time).
#[async_trait]
pub trait DuplexProvider: Send + Sync {
    async fn open_duplex_session(&self, system_prompt: &str) -> Result<Box<dyn DuplexSession>>;
}
