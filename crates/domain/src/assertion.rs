use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A typed predicate over a turn's response or over the whole conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    ContentIncludes {
        patterns: Vec<String>,
    },
    ContentMatches {
        pattern: String,
    },
    ContentNotEmpty,
    IsValidJson,
    JsonSchema {
        schema: serde_json::Value,
    },
    ToolsCalled {
        tools: Vec<String>,
    },
    ToolCallsWithArgs {
        tool_name: String,
        args: HashMap<String, serde_json::Value>,
    },
    AgentInvoked {
        agent_ref: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_calls: Option<u32>,
    },
    AgentNotInvoked {
        agent_ref: String,
    },
    AgentResponseContains {
        agent_ref: String,
        substring: String,
    },
    LlmJudge {
        judge_provider: String,
        criterion: String,
    },
    RestEval {
        endpoint: String,
        min_score: f64,
    },
    CustomValidator {
        name: String,
        #[serde(default)]
        params: HashMap<String, serde_json::Value>,
    },
}

impl Assertion {
    /// The taxonomy tag used in `ValidationError::assertion_type` and in
    /// trace events, matching this variant's serde tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Assertion::ContentIncludes { .. } => "content_includes",
            Assertion::ContentMatches { .. } => "content_matches",
            Assertion::ContentNotEmpty => "content_not_empty",
            Assertion::IsValidJson => "is_valid_json",
            Assertion::JsonSchema { .. } => "json_schema",
            Assertion::ToolsCalled { .. } => "tools_called",
            Assertion::ToolCallsWithArgs { .. } => "tool_calls_with_args",
            Assertion::AgentInvoked { .. } => "agent_invoked",
            Assertion::AgentNotInvoked { .. } => "agent_not_invoked",
            Assertion::AgentResponseContains { .. } => "agent_response_contains",
            Assertion::LlmJudge { .. } => "llm_judge",
            Assertion::RestEval { .. } => "rest_eval",
            Assertion::CustomValidator { .. } => "custom_validator",
        }
    }
}

/// Scope an assertion was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionScope {
    Turn,
    Conversation,
}

/// A single assertion failure, attached to the owning `RunResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub assertion_type: String,
    pub scope: AssertionScope,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(
        assertion: &Assertion,
        scope: AssertionScope,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            assertion_type: assertion.type_name().to_string(),
            scope,
            detail: detail.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_values(mut self, expected: serde_json::Value, actual: serde_json::Value) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_type_name_matches_serde_tag() {
        let assertion = Assertion::ContentIncludes {
            patterns: vec!["hi".into()],
        };
        let json = serde_json::to_value(&assertion).unwrap();
        assert_eq!(json["type"], assertion.type_name());
    }

    #[test]
    fn validation_error_carries_expected_and_actual() {
        let assertion = Assertion::ToolsCalled {
            tools: vec!["search".into()],
        };
        let err = ValidationError::new(&assertion, AssertionScope::Turn, "tool not called")
            .with_values(serde_json::json!(["search"]), serde_json::json!([]));
        assert_eq!(err.assertion_type, "tools_called");
        assert_eq!(err.expected, Some(serde_json::json!(["search"])));
    }

    #[test]
    fn custom_validator_deserializes_with_default_params() {
        let json = r#"{"type": "custom_validator", "name": "banned_words"}"#;
        let assertion: Assertion = serde_json::from_str(json).unwrap();
        match assertion {
            Assertion::CustomValidator { name, params } => {
                assert_eq!(name, "banned_words");
                assert!(params.is_empty());
            }
            _ => panic!("expected CustomValidator"),
        }
    }
}
