use std::collections::HashMap;

use async_trait::async_trait;
use conductor_domain::error::Result;

/// An asynchronous source of template values (§4.8). Providers run in
/// declared order; a later provider's keys override an earlier provider's
/// on conflict, and none of them can see what an earlier provider
/// produced — each is handed only the variable map accumulated so far as
/// read-only context, never a mutable view.
#[async_trait]
pub trait VariableProvider: Send + Sync {
    /// A short name used in trace events and in the
    /// `Error::VariableProvider` a failure is wrapped in.
    fn name(&self) -> &str;

    /// Produce this provider's contribution to the variable map. `seed`
    /// holds every fixture and variable resolved by providers run before
    /// this one.
    async fn provide(&self, seed: &HashMap<String, String>) -> Result<HashMap<String, String>>;
}

/// Runs a fixed, precomputed variable map — used for scenario fixtures
/// and in tests where no external lookup is needed.
pub struct StaticVariableProvider {
    name: String,
    values: HashMap<String, String>,
}

impl StaticVariableProvider {
    pub fn new(name: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self { name: name.into(), values }
    }
}

#[async_trait]
impl VariableProvider for StaticVariableProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, _seed: &HashMap<String, String>) -> Result<HashMap<String, String>> {
        Ok(self.values.clone())
    }
}

/// Run every provider in order, folding results into a single map.
/// Provider-supplied keys override earlier ones, including earlier
/// providers' own keys (§4.8). A provider error fails closed: the whole
/// resolution aborts rather than silently proceeding with partial
/// variables.
pub async fn resolve_variables(
    providers: &[std::sync::Arc<dyn VariableProvider>],
    seed: HashMap<String, String>,
) -> Result<HashMap<String, String>> {
    let mut merged = seed;
    for provider in providers {
        let contributed = provider.provide(&merged).await.map_err(|e| {
            conductor_domain::error::Error::VariableProvider {
                provider: provider.name().to_string(),
                message: e.to_string(),
            }
        })?;
        merged.extend(contributed);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl VariableProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn provide(&self, _seed: &HashMap<String, String>) -> Result<HashMap<String, String>> {
            Err(conductor_domain::error::Error::Other("boom".into()))
        }
    }

    #[tokio::test]
    async fn later_provider_overrides_earlier_keys() {
        let mut first = HashMap::new();
        first.insert("persona".into(), "support".into());
        let mut second = HashMap::new();
        second.insert("persona".into(), "escalation".into());

        let providers: Vec<std::sync::Arc<dyn VariableProvider>> = vec![
            std::sync::Arc::new(StaticVariableProvider::new("first", first)),
            std::sync::Arc::new(StaticVariableProvider::new("second", second)),
        ];
        let merged = resolve_variables(&providers, HashMap::new()).await.unwrap();
        assert_eq!(merged.get("persona").map(String::as_str), Some("escalation"));
    }

    #[tokio::test]
    async fn provider_error_fails_closed_as_variable_provider_error() {
        let providers: Vec<std::sync::Arc<dyn VariableProvider>> =
            vec![std::sync::Arc::new(FailingProvider)];
        let err = resolve_variables(&providers, HashMap::new()).await.unwrap_err();
        assert!(matches!(
            err,
            conductor_domain::error::Error::VariableProvider { provider, .. } if provider == "failing"
        ));
    }

    #[tokio::test]
    async fn seed_values_survive_when_no_provider_overrides_them() {
        let mut seed = HashMap::new();
        seed.insert("fixture_a".into(), "value_a".into());
        let merged = resolve_variables(&[], seed).await.unwrap();
        assert_eq!(merged.get("fixture_a").map(String::as_str), Some("value_a"));
    }
}
