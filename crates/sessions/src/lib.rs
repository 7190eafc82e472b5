//! `conductor-sessions` — the state store (§4.4): persists conversation
//! state across pipeline turns and across runs that share a conversation
//! id. Two implementations are provided: an in-memory map for mock/replay
//! runs and tests, and a one-file-per-conversation JSON store for
//! persistence across process restarts.

pub mod store;

pub use store::{FileStateStore, InMemoryStateStore, SharedStateStore, StateStore};
