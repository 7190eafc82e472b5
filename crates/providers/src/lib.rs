//! `conductor-providers` — the abstract provider/streaming layer (§1, §4).
//!
//! Concrete HTTP adapters to real vendor APIs are out of scope for the
//! core engine; this crate owns the `Provider` trait every stage depends
//! on, the `mock` and `replay` kinds the engine can build on its own, and
//! the registry that assembles a run's provider set.

pub mod audio;
pub mod audio_mock;
pub mod mock;
pub mod registry;
pub mod replay;
pub mod traits;
pub mod util;

pub use audio::{DuplexProvider, DuplexSession, SttService, TtsService, TurnDetector};
pub use mock::MockProvider;
pub use registry::{DuplexProviderRegistry, ProviderRegistry};
pub use replay::ReplayProvider;
pub use traits::{ChatRequest, ChatResponse, Provider};
