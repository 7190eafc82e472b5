use conductor_domain::scenario::{ToolChoice, ToolPolicy};

/// Why a tool call was refused. Carries enough detail for the provider
/// stage to fold this into a validation-style failure rather than a bare
/// error (§4.7: cap breaches end the turn, they don't abort the run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernorViolation {
    /// `tool_choice` is `none` but the model attempted a call.
    ToolsDisallowed,
    /// `tool_choice` names a specific tool and a different one was called.
    ToolNotAllowed { requested: String, allowed: String },
    /// `max_tool_calls_per_turn` would be exceeded by this call.
    PerTurnCapExceeded { limit: u32 },
    /// `max_total_tool_calls` would be exceeded by this call.
    TotalCapExceeded { limit: u32 },
    /// `tool_choice` is `required` but the turn's first response carried no
    /// tool calls at all.
    RequiredCallMissing,
}

impl std::fmt::Display for GovernorViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GovernorViolation::ToolsDisallowed => {
                write!(f, "tool-cap-exceeded: tool_choice is 'none' but a tool call was attempted")
            }
            GovernorViolation::ToolNotAllowed { requested, allowed } => write!(
                f,
                "tool-cap-exceeded: tool_choice requires '{allowed}', but '{requested}' was called"
            ),
            GovernorViolation::PerTurnCapExceeded { limit } => {
                write!(f, "tool-cap-exceeded: max_tool_calls_per_turn ({limit}) exceeded")
            }
            GovernorViolation::TotalCapExceeded { limit } => {
                write!(f, "tool-cap-exceeded: max_total_tool_calls ({limit}) exceeded")
            }
            GovernorViolation::RequiredCallMissing => write!(
                f,
                "tool-cap-exceeded: tool_choice is 'required' but no tool was called"
            ),
        }
    }
}

/// Tracks tool-call counts for a single run of a scenario against its
/// [`ToolPolicy`] and authorizes (or refuses) each attempted call.
///
/// This only governs the counting/policy decision; dispatching the call
/// and feeding the result back into the conversation is the provider
/// stage's job.
#[derive(Debug, Clone)]
pub struct ToolCallGovernor {
    policy: ToolPolicy,
    turn_count: u32,
    total_count: u32,
}

impl ToolCallGovernor {
    pub fn new(policy: ToolPolicy) -> Self {
        Self::with_total(policy, 0)
    }

    /// Resume a governor with a total count already accrued by earlier
    /// turns in the same run (§4.7: `max_total_tool_calls` spans the whole
    /// conversation, not a single turn).
    pub fn with_total(policy: ToolPolicy, total_count: u32) -> Self {
        Self {
            policy,
            turn_count: 0,
            total_count,
        }
    }

    /// Reset the per-turn counter at the start of a new turn. Total count
    /// carries across turns for the lifetime of the conversation.
    pub fn begin_turn(&mut self) {
        self.turn_count = 0;
    }

    /// Check whether `tool_name` may be called right now, without
    /// recording the attempt. Call [`Self::record_call`] after a
    /// successful dispatch.
    pub fn authorize(&self, tool_name: &str) -> Result<(), GovernorViolation> {
        match &self.policy.tool_choice {
            ToolChoice::None => return Err(GovernorViolation::ToolsDisallowed),
            ToolChoice::Named(name) if name != tool_name => {
                return Err(GovernorViolation::ToolNotAllowed {
                    requested: tool_name.to_string(),
                    allowed: name.clone(),
                });
            }
            _ => {}
        }

        if self.turn_count + 1 > self.policy.max_tool_calls_per_turn {
            return Err(GovernorViolation::PerTurnCapExceeded {
                limit: self.policy.max_tool_calls_per_turn,
            });
        }
        if self.total_count + 1 > self.policy.max_total_tool_calls {
            return Err(GovernorViolation::TotalCapExceeded {
                limit: self.policy.max_total_tool_calls,
            });
        }

        Ok(())
    }

    /// Check whether `tool_choice: required` was honored by a turn's first
    /// response. Call once per turn, before any tool calls from that
    /// response are authorized/dispatched.
    pub fn check_required(&self, first_response_has_tool_calls: bool) -> Result<(), GovernorViolation> {
        if matches!(self.policy.tool_choice, ToolChoice::Required) && !first_response_has_tool_calls {
            return Err(GovernorViolation::RequiredCallMissing);
        }
        Ok(())
    }

    pub fn record_call(&mut self) {
        self.turn_count += 1;
        self.total_count += 1;
    }

    pub fn total_calls(&self) -> u32 {
        self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(per_turn: u32, total: u32) -> ToolPolicy {
        ToolPolicy {
            tool_choice: ToolChoice::Auto,
            max_tool_calls_per_turn: per_turn,
            max_total_tool_calls: total,
        }
    }

    #[test]
    fn authorizes_calls_within_caps() {
        let gov = ToolCallGovernor::new(policy(2, 10));
        assert!(gov.authorize("search").is_ok());
    }

    #[test]
    fn refuses_when_tool_choice_is_none() {
        let gov = ToolCallGovernor::new(ToolPolicy {
            tool_choice: ToolChoice::None,
            ..policy(8, 32)
        });
        assert_eq!(gov.authorize("search").unwrap_err(), GovernorViolation::ToolsDisallowed);
    }

    #[test]
    fn refuses_tool_not_matching_named_choice() {
        let gov = ToolCallGovernor::new(ToolPolicy {
            tool_choice: ToolChoice::Named("search".into()),
            ..policy(8, 32)
        });
        assert!(gov.authorize("search").is_ok());
        assert!(matches!(
            gov.authorize("other"),
            Err(GovernorViolation::ToolNotAllowed { .. })
        ));
    }

    #[test]
    fn enforces_per_turn_cap() {
        let mut gov = ToolCallGovernor::new(policy(1, 10));
        assert!(gov.authorize("a").is_ok());
        gov.record_call();
        assert_eq!(
            gov.authorize("a").unwrap_err(),
            GovernorViolation::PerTurnCapExceeded { limit: 1 }
        );
        gov.begin_turn();
        assert!(gov.authorize("a").is_ok());
    }

    #[test]
    fn enforces_total_cap_across_turns() {
        let mut gov = ToolCallGovernor::new(policy(10, 1));
        assert!(gov.authorize("a").is_ok());
        gov.record_call();
        gov.begin_turn();
        assert_eq!(
            gov.authorize("a").unwrap_err(),
            GovernorViolation::TotalCapExceeded { limit: 1 }
        );
    }

    #[test]
    fn required_choice_demands_a_call_on_first_response() {
        let gov = ToolCallGovernor::new(ToolPolicy {
            tool_choice: ToolChoice::Required,
            ..policy(8, 32)
        });
        assert_eq!(
            gov.check_required(false).unwrap_err(),
            GovernorViolation::RequiredCallMissing
        );
        assert!(gov.check_required(true).is_ok());
    }

    #[test]
    fn non_required_choice_never_demands_a_call() {
        let gov = ToolCallGovernor::new(policy(8, 32));
        assert!(gov.check_required(false).is_ok());
    }

    #[test]
    fn with_total_resumes_a_prior_run_total() {
        let gov = ToolCallGovernor::with_total(policy(10, 3), 3);
        assert_eq!(
            gov.authorize("a").unwrap_err(),
            GovernorViolation::TotalCapExceeded { limit: 3 }
        );
    }
}
