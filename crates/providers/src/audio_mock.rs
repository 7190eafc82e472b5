//! Deterministic mocks for the abstract audio services (§4.1 step 6),
//! used by pipeline-stage unit tests that need an `SttService`/
//! `TtsService`/`TurnDetector`/`DuplexProvider` without a real backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use conductor_domain::audio::AudioFrame;
use conductor_domain::error::Result;

use crate::audio::{DuplexProvider, DuplexSession, SttService, TtsService, TurnDetector};

/// Always returns a fixed transcript, regardless of the audio it's given.
pub struct MockSttService {
    transcript: String,
}

impl MockSttService {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl SttService for MockSttService {
    async fn transcribe(&self, _audio: &[AudioFrame]) -> Result<String> {
        Ok(self.transcript.clone())
    }
}

/// Synthesizes one fixed audio frame per call, echoing the text length
/// into the frame so tests can tell synthesized chunks apart.
pub struct MockTtsService {
    mime_type: String,
}

impl MockTtsService {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
        }
    }
}

#[async_trait]
impl TtsService for MockTtsService {
    async fn synthesize(&self, text: &str) -> Result<Vec<AudioFrame>> {
        Ok(vec![AudioFrame::new(format!("synth:{text}"), self.mime_type.clone())])
    }
}

/// Signals a turn boundary after a fixed number of chunks have been
/// pushed, and reports interruption once told to via
/// [`MockTurnDetector::interrupt_next`].
pub struct MockTurnDetector {
    chunks_per_turn: usize,
    seen: Mutex<usize>,
    interrupt: AtomicBool,
}

impl MockTurnDetector {
    pub fn new(chunks_per_turn: usize) -> Self {
        Self {
            chunks_per_turn,
            seen: Mutex::new(0),
            interrupt: AtomicBool::new(false),
        }
    }

    /// Arranges for the next `should_interrupt` call to report `true`.
    pub fn interrupt_next(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }
}

impl TurnDetector for MockTurnDetector {
    fn push(&self, _chunk: &AudioFrame) -> bool {
        let mut seen = self.seen.lock();
        *seen += 1;
        *seen >= self.chunks_per_turn
    }

    fn should_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }

    fn reset(&self) {
        *self.seen.lock() = 0;
    }
}

/// A duplex session that echoes every frame sent to it back out, after
/// recording it — drains a fixed reply queue instead if one is given.
pub struct MockDuplexSession {
    replies: Mutex<VecDeque<AudioFrame>>,
    sent: Mutex<Vec<AudioFrame>>,
}

impl MockDuplexSession {
    pub fn new(replies: Vec<AudioFrame>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_frames(&self) -> Vec<AudioFrame> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl DuplexSession for MockDuplexSession {
    async fn send_audio(&self, chunk: AudioFrame) -> Result<()> {
        self.sent.lock().push(chunk);
        Ok(())
    }

    async fn recv_audio(&self) -> Result<Option<AudioFrame>> {
        Ok(self.replies.lock().pop_front())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Opens a fixed [`MockDuplexSession`] on every call.
pub struct MockDuplexProvider {
    replies: Vec<AudioFrame>,
}

impl MockDuplexProvider {
    pub fn new(replies: Vec<AudioFrame>) -> Self {
        Self { replies }
    }
}

#[async_trait]
impl DuplexProvider for MockDuplexProvider {
    async fn open_duplex_session(&self, _system_prompt: &str) -> Result<Box<dyn DuplexSession>> {
        Ok(Box::new(MockDuplexSession::new(self.replies.clone())))
    }
}
