use serde::{Deserialize, Serialize};

/// One chunk of raw audio, the shape the VAD stage chain and
/// `DuplexProviderStage` pass between themselves and the abstract
/// STT/TTS/turn-detector services (§4.1 step 6). Mirrors the fields
/// `ElementPayload::AudioChunk` carries on the wire (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrame {
    pub data: String,
    pub mime_type: String,
}

impl AudioFrame {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}
