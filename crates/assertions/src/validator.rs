//! Custom validator plug-ins resolved by `custom_validator` assertions
//! (§4.3). A name (e.g. `banned_words`, `check_pii`) binds to a
//! constructor that accepts the assertion's parameter map and produces a
//! [`Validator`]; a crashed or missing constructor is a
//! [`conductor_domain::error::Error::ValidatorMachinery`], distinct from
//! the validator simply returning "failed".

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use conductor_domain::error::{Error, Result};
use serde_json::Value;

/// A constructed, ready-to-run custom validator.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Evaluate `response_text` and return `(passed, detail_message)`.
    async fn validate(&self, response_text: &str) -> Result<(bool, String)>;
}

/// Builds a [`Validator`] from a `custom_validator` assertion's `params`
/// map. Returning `Err` here is a validator-machinery error, not a failed
/// assertion.
pub type ValidatorConstructor =
    Arc<dyn Fn(&HashMap<String, Value>) -> Result<Arc<dyn Validator>> + Send + Sync>;

/// Binds names to validator constructors. Seeded with two built-ins
/// (`banned_words`, `check_pii`); embedding code may register more before
/// execution begins (the registry is treated as immutable during a
/// plan's execution, like the tool and prompt registries, §5).
pub struct ValidatorRegistry {
    constructors: HashMap<String, ValidatorConstructor>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };
        registry.register("banned_words", Arc::new(build_banned_words));
        registry.register("check_pii", Arc::new(build_check_pii));
        registry
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: ValidatorConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Construct the named validator. A missing name or a constructor
    /// that returns `Err` both surface as [`Error::ValidatorMachinery`].
    pub fn build(&self, name: &str, params: &HashMap<String, Value>) -> Result<Arc<dyn Validator>> {
        let constructor = self.constructors.get(name).ok_or_else(|| Error::ValidatorMachinery {
            validator_name: name.to_string(),
            message: "no validator registered with this name".into(),
        })?;
        constructor(params).map_err(|e| Error::ValidatorMachinery {
            validator_name: name.to_string(),
            message: e.to_string(),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Built-in validators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct BannedWords {
    words: Vec<String>,
}

#[async_trait]
impl Validator for BannedWords {
    async fn validate(&self, response_text: &str) -> Result<(bool, String)> {
        let lower = response_text.to_lowercase();
        let hit = self.words.iter().find(|w| lower.contains(w.as_str()));
        match hit {
            Some(word) => Ok((false, format!("response contains banned word \"{word}\""))),
            None => Ok((true, "no banned words found".into())),
        }
    }
}

fn build_banned_words(params: &HashMap<String, Value>) -> Result<Arc<dyn Validator>> {
    let words = params
        .get("words")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Other("banned_words validator requires a \"words\" array param".into()))?
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_lowercase()))
        .collect();
    Ok(Arc::new(BannedWords { words }))
}

struct CheckPii {
    email: regex::Regex,
    phone: regex::Regex,
    ssn: regex::Regex,
}

#[async_trait]
impl Validator for CheckPii {
    async fn validate(&self, response_text: &str) -> Result<(bool, String)> {
        if self.email.is_match(response_text) {
            return Ok((false, "response contains what looks like an email address".into()));
        }
        if self.ssn.is_match(response_text) {
            return Ok((false, "response contains what looks like a social security number".into()));
        }
        if self.phone.is_match(response_text) {
            return Ok((false, "response contains what looks like a phone number".into()));
        }
        Ok((true, "no PII patterns detected".into()))
    }
}

fn build_check_pii(_params: &HashMap<String, Value>) -> Result<Arc<dyn Validator>> {
    Ok(Arc::new(CheckPii {
        email: regex::Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        phone: regex::Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
        ssn: regex::Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn banned_words_flags_configured_word() {
        let registry = ValidatorRegistry::new();
        let mut params = HashMap::new();
        params.insert("words".into(), serde_json::json!(["confidential"]));
        let validator = registry.build("banned_words", &params).unwrap();
        let (passed, _) = validator.validate("this is confidential data").await.unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn banned_words_passes_clean_text() {
        let registry = ValidatorRegistry::new();
        let mut params = HashMap::new();
        params.insert("words".into(), serde_json::json!(["confidential"]));
        let validator = registry.build("banned_words", &params).unwrap();
        let (passed, _) = validator.validate("this is fine").await.unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn check_pii_flags_email() {
        let registry = ValidatorRegistry::new();
        let validator = registry.build("check_pii", &HashMap::new()).unwrap();
        let (passed, _) = validator.validate("contact me at alice@example.com").await.unwrap();
        assert!(!passed);
    }

    #[test]
    fn unknown_validator_name_is_machinery_error() {
        let registry = ValidatorRegistry::new();
        let err = registry.build("not_a_real_validator", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::ValidatorMachinery { .. }));
    }

    #[test]
    fn banned_words_without_params_is_machinery_error() {
        let registry = ValidatorRegistry::new();
        let err = registry.build("banned_words", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::ValidatorMachinery { .. }));
    }
}
