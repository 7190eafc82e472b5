//! State store (§4.4): persists a conversation's accumulated
//! [`ConversationState`] across pipeline stage invocations and across
//! turns within the same run. `Load` followed by `Save` followed by
//! `Load` must round-trip identically (§8.5) — both implementations here
//! hold the full serialized state rather than diffing it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use conductor_domain::conversation::ConversationState;
use conductor_domain::error::{Error, Result};

/// Load/save/delete a conversation's state by id.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationState>>;
    async fn save(&self, state: &ConversationState) -> Result<()>;
    async fn delete(&self, conversation_id: &str) -> Result<()>;
}

/// Purely in-process store — the default for mock/replay runs and tests.
/// State does not survive process exit.
#[derive(Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.states.read().get(conversation_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        self.states
            .write()
            .insert(state.conversation_id.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.states.write().remove(conversation_id);
        Ok(())
    }
}

/// Persists each conversation as its own JSON file under `directory`, named
/// `{conversation_id}.json`. One file per conversation keeps concurrent
/// runs (the executor's worker pool) from contending on a single shared
/// file the way a monolithic session table would.
pub struct FileStateStore {
    directory: PathBuf,
}

impl FileStateStore {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(Error::Io)?;
        Ok(Self { directory })
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        self.directory.join(format!("{conversation_id}.json"))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationState>> {
        let path = self.path_for(conversation_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&path).await.map_err(Error::Io)?;
        let state: ConversationState = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        let path = self.path_for(&state.conversation_id);
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&path, json).await.map_err(Error::Io)?;
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        let path = self.path_for(conversation_id);
        if path.exists() {
            tokio::fs::remove_file(&path).await.map_err(Error::Io)?;
        }
        Ok(())
    }
}

/// Convenience alias used by stage wiring to hold either store kind behind
/// one pointer.
pub type SharedStateStore = Arc<dyn StateStore>;
