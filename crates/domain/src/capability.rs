use serde::{Deserialize, Serialize};

/// Capabilities a provider advertises. Scenarios declare `required_capabilities`
/// and the planner gates the run matrix on a subset check against this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCapabilities {
    pub supports_tools: ToolSupport,
    pub supports_streaming: bool,
    pub supports_json_mode: bool,
    pub supports_vision: bool,
    pub supports_audio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmCapabilities {
    fn default() -> Self {
        Self {
            supports_tools: ToolSupport::None,
            supports_streaming: false,
            supports_json_mode: false,
            supports_vision: false,
            supports_audio: false,
            context_window_tokens: None,
            max_output_tokens: None,
        }
    }
}

impl LlmCapabilities {
    /// Whether this provider advertises the given tagged capability.
    pub fn supports(&self, cap: Capability) -> bool {
        match cap {
            Capability::Vision => self.supports_vision,
            Capability::Streaming => self.supports_streaming,
            Capability::Tools => self.supports_tools != ToolSupport::None,
            Capability::Audio => self.supports_audio,
            Capability::Json => self.supports_json_mode,
        }
    }

    /// Every capability in `required` that this provider does *not* advertise.
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .copied()
            .filter(|c| !self.supports(*c))
            .collect()
    }
}

/// Tool support level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSupport {
    /// No tool calling support.
    None,
    /// Basic tool calling (function calling).
    Basic,
    /// Strict JSON schema-validated tool calling.
    StrictJson,
}

/// A tag declaring that a provider supports some feature. Scenarios list
/// the capabilities they require; the planner drops combinations whose
/// provider doesn't advertise all of them (§8 invariant 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Vision,
    Streaming,
    Tools,
    Audio,
    Json,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Vision => "vision",
            Capability::Streaming => "streaming",
            Capability::Tools => "tools",
            Capability::Audio => "audio",
            Capability::Json => "json",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_empty_when_all_supported() {
        let caps = LlmCapabilities {
            supports_vision: true,
            supports_streaming: true,
            ..LlmCapabilities::default()
        };
        assert!(caps
            .missing(&[Capability::Vision, Capability::Streaming])
            .is_empty());
    }

    #[test]
    fn missing_reports_unsupported_capability() {
        let caps = LlmCapabilities::default();
        let missing = caps.missing(&[Capability::Vision]);
        assert_eq!(missing, vec![Capability::Vision]);
    }

    #[test]
    fn tools_capability_requires_non_none_support() {
        let mut caps = LlmCapabilities::default();
        assert!(!caps.supports(Capability::Tools));
        caps.supports_tools = ToolSupport::Basic;
        assert!(caps.supports(Capability::Tools));
    }
}
