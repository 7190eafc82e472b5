//! The single entry point for assertion evaluation (§4.3): [`evaluate`]
//! dispatches on an [`Assertion`] variant and returns `Ok(None)` on pass,
//! `Ok(Some(ValidationError))` on a normal failure, or `Err(_)` when the
//! evaluation machinery itself failed.

use std::collections::HashMap;

use conductor_domain::assertion::{Assertion, AssertionScope, ValidationError};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::{Message, Role, ToolCall};
use conductor_providers::registry::ProviderRegistry;

use crate::validator::ValidatorRegistry;
use crate::{judge, rest_eval};

/// What a single `evaluate` call has available to inspect. Agent-related
/// assertions (`agent_invoked`, `tool_calls_with_args`, …) always walk
/// `history`, since the evidence they need — the tool-result message a
/// call produced — only exists once appended to the conversation, never
/// inside a bare turn response.
pub struct EvalInput<'a> {
    pub scope: AssertionScope,
    /// The assistant's response for the turn being checked. `None` when
    /// evaluating a conversation-level assertion with no single turn in
    /// focus.
    pub turn_response: Option<&'a Message>,
    /// Tool calls the model made on the turn being checked.
    pub turn_tool_calls: &'a [ToolCall],
    /// The full message history so far (including `turn_response`, if any).
    pub history: &'a [Message],
}

/// Collaborators `evaluate` needs for the assertion kinds that reach
/// outside the conversation itself.
pub struct EvalContext<'a> {
    pub providers: &'a ProviderRegistry,
    pub default_judge_provider: Option<&'a str>,
    pub validators: &'a ValidatorRegistry,
    pub http_client: &'a reqwest::Client,
}

fn subject_text<'a>(input: &'a EvalInput<'a>) -> &'a str {
    if let Some(msg) = input.turn_response {
        return msg.text_content().unwrap_or("");
    }
    input
        .history
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .and_then(|m| m.text_content())
        .unwrap_or("")
}

fn violation(assertion: &Assertion, scope: AssertionScope, detail: impl Into<String>) -> Option<ValidationError> {
    Some(ValidationError::new(assertion, scope, detail))
}

/// Every tool call made by an assistant message in `messages`, in order.
fn all_tool_calls(messages: &[Message]) -> Vec<&ToolCall> {
    messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .filter_map(|m| m.tool_calls.as_ref())
        .flatten()
        .collect()
}

/// Maps a tool call id to the name of the tool it invoked, across the
/// whole history — used to resolve a tool-result message (which only
/// carries `reply_to`) back to the agent that produced it.
fn call_id_to_tool_name(messages: &[Message]) -> HashMap<&str, &str> {
    all_tool_calls(messages)
        .into_iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect()
}

pub async fn evaluate(
    assertion: &Assertion,
    input: &EvalInput<'_>,
    ctx: &EvalContext<'_>,
) -> Result<Option<ValidationError>> {
    let scope = input.scope;
    match assertion {
        Assertion::ContentIncludes { patterns } => {
            let text = subject_text(input).to_lowercase();
            let missing: Vec<&String> = patterns.iter().filter(|p| !text.contains(&p.to_lowercase())).collect();
            if missing.is_empty() {
                Ok(None)
            } else {
                Ok(violation(
                    assertion,
                    scope,
                    format!("response is missing required substrings: {missing:?}"),
                ))
            }
        }

        Assertion::ContentMatches { pattern } => {
            let text = subject_text(input);
            let re = regex::Regex::new(pattern)
                .map_err(|e| Error::Other(format!("content_matches: invalid regex \"{pattern}\": {e}")))?;
            if re.is_match(text) {
                Ok(None)
            } else {
                Ok(violation(assertion, scope, format!("response does not match /{pattern}/")))
            }
        }

        Assertion::ContentNotEmpty => {
            let text = subject_text(input);
            if text.trim().is_empty() {
                Ok(violation(assertion, scope, "response content is empty"))
            } else {
                Ok(None)
            }
        }

        Assertion::IsValidJson => {
            let text = subject_text(input);
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(_) => Ok(None),
                Err(e) => Ok(violation(assertion, scope, format!("response is not valid JSON: {e}"))),
            }
        }

        Assertion::JsonSchema { schema } => {
            let text = subject_text(input);
            let parsed: serde_json::Value = match serde_json::from_str(text) {
                Ok(v) => v,
                Err(e) => return Ok(violation(assertion, scope, format!("response is not valid JSON: {e}"))),
            };
            let compiled = jsonschema::JSONSchema::compile(schema)
                .map_err(|e| Error::Other(format!("json_schema: invalid schema document: {e}")))?;
            match compiled.validate(&parsed) {
                Ok(()) => Ok(None),
                Err(errors) => {
                    let detail = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
                    Ok(violation(assertion, scope, format!("response does not conform to schema: {detail}")))
                }
            }
        }

        Assertion::ToolsCalled { tools } => {
            let called: Vec<&str> = input.turn_tool_calls.iter().map(|c| c.name.as_str()).collect();
            let missing: Vec<&String> = tools.iter().filter(|t| !called.contains(&t.as_str())).collect();
            if missing.is_empty() {
                Ok(None)
            } else {
                let v = ValidationError::new(assertion, scope, format!("tool(s) not called this turn: {missing:?}"))
                    .with_values(serde_json::json!(tools), serde_json::json!(called));
                Ok(Some(v))
            }
        }

        Assertion::ToolCallsWithArgs { tool_name, args } => {
            let calls = all_tool_calls(input.history);
            let matched = calls.iter().any(|c| {
                c.name == *tool_name
                    && c.arguments
                        .as_object()
                        .map(|obj| args.iter().all(|(k, v)| obj.get(k) == Some(v)))
                        .unwrap_or(false)
            });
            if matched {
                Ok(None)
            } else {
                Ok(violation(
                    assertion,
                    scope,
                    format!("no call to \"{tool_name}\" matched the expected arguments {args:?}"),
                ))
            }
        }

        Assertion::AgentInvoked { agent_ref, min_calls } => {
            let prefix = format!("a2a__{agent_ref}__");
            let count = all_tool_calls(input.history)
                .into_iter()
                .filter(|c| c.name.starts_with(&prefix))
                .count() as u32;
            let required = min_calls.unwrap_or(1).max(1);
            if count >= required {
                Ok(None)
            } else {
                Ok(violation(
                    assertion,
                    scope,
                    format!("agent \"{agent_ref}\" was invoked {count} time(s), expected at least {required}"),
                ))
            }
        }

        Assertion::AgentNotInvoked { agent_ref } => {
            let prefix = format!("a2a__{agent_ref}__");
            let count = all_tool_calls(input.history).into_iter().filter(|c| c.name.starts_with(&prefix)).count();
            if count == 0 {
                Ok(None)
            } else {
                Ok(violation(assertion, scope, format!("agent \"{agent_ref}\" was invoked {count} time(s)")))
            }
        }

        Assertion::AgentResponseContains { agent_ref, substring } => {
            let prefix = format!("a2a__{agent_ref}__");
            let id_to_name = call_id_to_tool_name(input.history);
            let matched = input.history.iter().any(|m| {
                m.role == Role::Tool
                    && m.tool_result
                        .as_ref()
                        .map(|tr| {
                            id_to_name
                                .get(tr.reply_to.as_str())
                                .is_some_and(|name| name.starts_with(&prefix))
                                && tr.content.contains(substring.as_str())
                        })
                        .unwrap_or(false)
            });
            if matched {
                Ok(None)
            } else {
                Ok(violation(
                    assertion,
                    scope,
                    format!("no tool-result from agent \"{agent_ref}\" contains \"{substring}\""),
                ))
            }
        }

        Assertion::LlmJudge { judge_provider, criterion } => {
            let provider_id = if judge_provider.is_empty() {
                ctx.default_judge_provider.ok_or_else(|| {
                    Error::Config("llm_judge: no judge_provider given and no default_judge_provider configured".into())
                })?
            } else {
                judge_provider.as_str()
            };
            let provider = ctx.providers.get(provider_id).ok_or_else(|| {
                Error::Config(format!("llm_judge: provider \"{provider_id}\" is not registered"))
            })?;
            let text = subject_text(input);
            let verdict = judge::judge(provider.as_ref(), criterion, text).await?;
            if verdict.pass {
                Ok(None)
            } else {
                Ok(violation(assertion, scope, format!("judge verdict: FAIL — {}", verdict.rationale)))
            }
        }

        Assertion::RestEval { endpoint, min_score } => {
            let text = subject_text(input);
            let (score, detail) = rest_eval::score_response(ctx.http_client, endpoint, text).await?;
            if score >= *min_score {
                Ok(None)
            } else {
                let detail = detail.unwrap_or_default();
                let v = ValidationError::new(
                    assertion,
                    scope,
                    format!("rest_eval score {score} is below min_score {min_score} ({detail})"),
                )
                .with_values(serde_json::json!(min_score), serde_json::json!(score));
                Ok(Some(v))
            }
        }

        Assertion::CustomValidator { name, params } => {
            let validator = ctx.validators.build(name, params)?;
            let text = subject_text(input);
            let (passed, detail) = validator.validate(text).await?;
            if passed {
                Ok(None)
            } else {
                Ok(violation(assertion, scope, detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::message::Message;

    fn ctx_fixtures() -> (ProviderRegistry, ValidatorRegistry, reqwest::Client) {
        (ProviderRegistry::new(), ValidatorRegistry::new(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn content_includes_passes_when_all_patterns_present() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let response = Message::assistant("Hello, world!");
        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: Some(&response),
            turn_tool_calls: &[],
            history: &[],
        };
        let assertion = Assertion::ContentIncludes { patterns: vec!["hello".into()] };
        let result = evaluate(&assertion, &input, &ctx).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn content_includes_fails_on_missing_pattern() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let response = Message::assistant("Hello!");
        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: Some(&response),
            turn_tool_calls: &[],
            history: &[],
        };
        let assertion = Assertion::ContentIncludes { patterns: vec!["goodbye".into()] };
        let result = evaluate(&assertion, &input, &ctx).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn is_valid_json_detects_malformed_response() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let response = Message::assistant("not json");
        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: Some(&response),
            turn_tool_calls: &[],
            history: &[],
        };
        let result = evaluate(&Assertion::IsValidJson, &input, &ctx).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn tools_called_checks_current_turn_only() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let response = Message::assistant("ok");
        let call = ToolCall { id: "1".into(), name: "search".into(), arguments: serde_json::json!({}) };
        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: Some(&response),
            turn_tool_calls: std::slice::from_ref(&call),
            history: &[],
        };
        let assertion = Assertion::ToolsCalled { tools: vec!["search".into()] };
        assert!(evaluate(&assertion, &input, &ctx).await.unwrap().is_none());

        let assertion = Assertion::ToolsCalled { tools: vec!["other".into()] };
        assert!(evaluate(&assertion, &input, &ctx).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn agent_invoked_counts_a2a_prefixed_calls_across_history() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let mut assistant = Message::assistant("calling planner");
        assistant.tool_calls = Some(vec![ToolCall {
            id: "c1".into(),
            name: "a2a__planner__decompose".into(),
            arguments: serde_json::json!({}),
        }]);
        let history = vec![Message::user("go"), assistant];
        let input = EvalInput {
            scope: AssertionScope::Conversation,
            turn_response: None,
            turn_tool_calls: &[],
            history: &history,
        };
        let assertion = Assertion::AgentInvoked { agent_ref: "planner".into(), min_calls: None };
        assert!(evaluate(&assertion, &input, &ctx).await.unwrap().is_none());

        let assertion = Assertion::AgentNotInvoked { agent_ref: "other".into() };
        assert!(evaluate(&assertion, &input, &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn agent_response_contains_resolves_through_reply_to() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let mut assistant = Message::assistant("calling planner");
        assistant.tool_calls = Some(vec![ToolCall {
            id: "c1".into(),
            name: "a2a__planner__decompose".into(),
            arguments: serde_json::json!({}),
        }]);
        let tool_result = Message::tool_result("c1", "plan: step one, step two");
        let history = vec![Message::user("go"), assistant, tool_result];
        let input = EvalInput {
            scope: AssertionScope::Conversation,
            turn_response: None,
            turn_tool_calls: &[],
            history: &history,
        };
        let assertion = Assertion::AgentResponseContains {
            agent_ref: "planner".into(),
            substring: "step one".into(),
        };
        assert!(evaluate(&assertion, &input, &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn custom_validator_with_unknown_name_is_machinery_error() {
        let (providers, validators, client) = ctx_fixtures();
        let ctx = EvalContext {
            providers: &providers,
            default_judge_provider: None,
            validators: &validators,
            http_client: &client,
        };
        let response = Message::assistant("hi");
        let input = EvalInput {
            scope: AssertionScope::Turn,
            turn_response: Some(&response),
            turn_tool_calls: &[],
            history: &[],
        };
        let assertion = Assertion::CustomValidator { name: "nope".into(), params: HashMap::new() };
        let err = evaluate(&assertion, &input, &ctx).await.unwrap_err();
        assert!(matches!(err, Error::ValidatorMachinery { .. }));
    }
}
