//! Recording adapter registry (§4.6): pluggable loaders that turn an
//! external recording format into the canonical message shape plus a
//! metadata record. Registration order is precedence — more specific
//! adapters are tried first.

pub mod arena;
pub mod session;
pub mod transcript;

use conductor_domain::error::Result;
use conductor_domain::message::Message;
use conductor_domain::recording::{RecordingFormat, RecordingMetadata, RecordingRef};

/// A single loaded conversation plus the metadata the adapter could
/// recover from its source format.
#[derive(Debug, Clone)]
pub struct LoadedRecording {
    pub messages: Vec<Message>,
    pub metadata: RecordingMetadata,
}

/// A loader for one recording source format.
#[async_trait::async_trait]
pub trait RecordingAdapter: Send + Sync {
    fn format(&self) -> RecordingFormat;

    /// Whether this adapter can read `source`, given an optional
    /// type hint that skips probing when the format is already known.
    fn can_handle(&self, source: &str, type_hint: Option<RecordingFormat>) -> bool;

    /// Expand `source` (a path, possibly a glob) into individual
    /// recording references.
    async fn enumerate(&self, source: &str) -> Result<Vec<RecordingRef>>;

    /// Load one recording reference into its canonical form.
    async fn load(&self, reference: &RecordingRef) -> Result<LoadedRecording>;
}

/// An ordered list of adapters, tried in registration order. The first
/// adapter whose `can_handle` returns `true` services a given source.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<std::sync::Arc<dyn RecordingAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self { adapters: Vec::new() }
    }

    /// The engine's built-in adapters, most specific first: session
    /// recordings (the engine's own format) before the more permissive
    /// arena-output and transcript readers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(std::sync::Arc::new(session::SessionAdapter));
        registry.register(std::sync::Arc::new(arena::ArenaOutputAdapter));
        registry.register(std::sync::Arc::new(transcript::TranscriptAdapter));
        registry
    }

    pub fn register(&mut self, adapter: std::sync::Arc<dyn RecordingAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn find(&self, source: &str, type_hint: Option<RecordingFormat>) -> Option<&std::sync::Arc<dyn RecordingAdapter>> {
        self.adapters.iter().find(|a| a.can_handle(source, type_hint))
    }

    pub async fn enumerate(&self, source: &str, type_hint: Option<RecordingFormat>) -> Result<Vec<RecordingRef>> {
        match self.find(source, type_hint) {
            Some(adapter) => adapter.enumerate(source).await,
            None => Err(conductor_domain::error::Error::UnsupportedOperation(format!(
                "no recording adapter can handle \"{source}\""
            ))),
        }
    }

    pub async fn load(&self, reference: &RecordingRef) -> Result<LoadedRecording> {
        match self.find(&reference.source, reference.type_hint) {
            Some(adapter) => adapter.load(reference).await,
            None => Err(conductor_domain::error::Error::UnsupportedOperation(format!(
                "no recording adapter can handle \"{}\"",
                reference.source
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builtins_registers_in_precedence_order() {
        let registry = AdapterRegistry::with_builtins();
        assert_eq!(registry.adapters.len(), 3);
        assert_eq!(registry.adapters[0].format(), RecordingFormat::Session);
        assert_eq!(registry.adapters[1].format(), RecordingFormat::ArenaOutput);
        assert_eq!(registry.adapters[2].format(), RecordingFormat::Transcript);
    }
}
