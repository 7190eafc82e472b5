//! Provider registry — holds every `Provider` available to a run plan.
//!
//! The registry constructs the `mock` kind natively; `http` and `replay`
//! kinds require an externally-supplied implementation (a real vendor
//! HTTP client, or a recording turned into a response queue) which the
//! caller registers by provider id before — or instead of — calling
//! [`ProviderRegistry::from_config`].

use std::collections::HashMap;
use std::sync::Arc;

use conductor_domain::config::{LlmConfig, ProviderConfig, ProviderKind};
use conductor_domain::error::{Error, Result};

use crate::audio::DuplexProvider;
use crate::mock::MockProvider;
use crate::traits::Provider;

/// Holds all instantiated providers, keyed by `ProviderConfig::id`.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the engine's `LlmConfig`.
    ///
    /// `external` supplies already-constructed providers for any `http`
    /// or `replay` entries, keyed by `ProviderConfig::id`. A config entry
    /// of either kind with no matching external provider is a
    /// configuration error (§7) — the engine has no way to satisfy it on
    /// its own.
    pub fn from_config(
        config: &LlmConfig,
        external: HashMap<String, Arc<dyn Provider>>,
    ) -> Result<Self> {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();

        for pc in &config.providers {
            let provider = Self::build_one(pc, &external)?;
            tracing::info!(provider_id = %pc.id, kind = ?pc.kind, "registered provider");
            providers.insert(pc.id.clone(), provider);
        }

        Ok(Self { providers })
    }

    fn build_one(
        pc: &ProviderConfig,
        external: &HashMap<String, Arc<dyn Provider>>,
    ) -> Result<Arc<dyn Provider>> {
        match pc.kind {
            ProviderKind::Mock => Ok(Arc::new(MockProvider::echo(
                pc.id.clone(),
                pc.capabilities.clone(),
            ))),
            ProviderKind::Http | ProviderKind::Replay => external.get(&pc.id).cloned().ok_or_else(|| {
                Error::Config(format!(
                    "provider \"{}\" is kind {:?} but no external implementation was registered for it",
                    pc.id, pc.kind
                ))
            }),
        }
    }

    /// Register (or replace) a provider directly, bypassing config.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.provider_id().to_string(), provider);
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(provider_id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn Provider>)> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Holds every provider that additionally exposes a [`DuplexProvider`]
/// session, keyed by the same provider id used in [`ProviderRegistry`].
/// Kept separate because only a handful of native-audio providers
/// implement it, unlike every provider implementing [`Provider`].
#[derive(Default)]
pub struct DuplexProviderRegistry {
    providers: HashMap<String, Arc<dyn DuplexProvider>>,
}

impl DuplexProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider_id: impl Into<String>, provider: Arc<dyn DuplexProvider>) {
        self.providers.insert(provider_id.into(), provider);
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn DuplexProvider>> {
        self.providers.get(provider_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
