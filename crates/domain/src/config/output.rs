use serde::{Deserialize, Serialize};

/// Which result-repository sinks the composite repository should wrap, and
/// where they write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<JsonRepositoryConfig>,
    #[serde(default)]
    pub junit: Option<JunitRepositoryConfig>,
    #[serde(default)]
    pub html: Option<HtmlRepositoryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRepositoryConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JunitRepositoryConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlRepositoryConfig {
    pub path: String,
}
