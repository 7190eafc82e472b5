use crate::assertion::Assertion;
use crate::capability::Capability;
use crate::message::{ContentPart, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A declarative test conversation, executed against one provider and one
/// prompt configuration per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// Selects the prompt config to assemble for this scenario's runs.
    pub task_type: String,
    #[serde(default)]
    pub required_capabilities: Vec<Capability>,
    #[serde(default)]
    pub tool_policy: ToolPolicy,
    /// Named values substituted into message templates.
    #[serde(default)]
    pub fixtures: HashMap<String, serde_json::Value>,
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub conversation_assertions: Vec<Assertion>,
}

/// One scripted turn within a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
    /// Reference to the persona driving this turn, for self-play scenarios
    /// where a second model plays the user side instead of a fixed script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaRef>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl TurnContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TurnContent::Text(t) => Some(t.as_str()),
            TurnContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRef {
    pub persona_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_override: Option<String>,
}

/// Per-scenario constraints on tool invocation, honored by the provider
/// stage's tool-call loop (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPolicy {
    #[serde(default)]
    pub tool_choice: ToolChoice,
    #[serde(default = "default_max_per_turn")]
    pub max_tool_calls_per_turn: u32,
    #[serde(default = "default_max_total")]
    pub max_total_tool_calls: u32,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            tool_choice: ToolChoice::Auto,
            max_tool_calls_per_turn: default_max_per_turn(),
            max_total_tool_calls: default_max_total(),
        }
    }
}

fn default_max_per_turn() -> u32 {
    8
}

fn default_max_total() -> u32 {
    32
}

/// How the provider stage should drive tool calling for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Named(String),
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

impl Serialize for ToolChoice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            ToolChoice::None => "none",
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::Named(name) => name.as_str(),
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "none" => ToolChoice::None,
            "auto" => ToolChoice::Auto,
            "required" => ToolChoice::Required,
            _ => ToolChoice::Named(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_named_round_trips() {
        let choice = ToolChoice::Named("search".into());
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, "\"search\"");
        let back: ToolChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ToolChoice::Named("search".into()));
    }

    #[test]
    fn tool_choice_well_known_values_round_trip() {
        for (choice, expected) in [
            (ToolChoice::None, "\"none\""),
            (ToolChoice::Auto, "\"auto\""),
            (ToolChoice::Required, "\"required\""),
        ] {
            assert_eq!(serde_json::to_string(&choice).unwrap(), expected);
        }
    }

    #[test]
    fn turn_content_as_text_reads_through_parts() {
        let content = TurnContent::Parts(vec![ContentPart::Text {
            text: "hi".into(),
        }]);
        assert_eq!(content.as_text(), Some("hi"));
    }

    #[test]
    fn tool_policy_defaults_are_finite() {
        let policy = ToolPolicy::default();
        assert!(policy.max_tool_calls_per_turn > 0);
        assert!(policy.max_total_tool_calls > 0);
    }
}
