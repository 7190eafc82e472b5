mod context_budget;
mod execution;
mod llm;
mod mcp;
mod output;
mod prompt;
mod tools;

pub use context_budget::*;
pub use execution::*;
pub use llm::*;
pub use mcp::*;
pub use output::*;
pub use prompt::*;
pub use tools::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The fully parsed, already-validated configuration the CLI hands to the
/// planner. Parsing YAML/TOML documents into this shape is a collaborator
/// (§6); this crate owns only the Rust shape and its `validate()` pass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub prompts: PromptRegistryConfig,
    #[serde(default)]
    pub context_budget: ContextBudgetConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues. An empty
    /// vec with no `Error`-severity entries means execution may proceed
    /// (Configuration error, §7, fails the whole invocation before
    /// execution otherwise).
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.llm.providers.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.providers".into(),
                message: "no providers configured".into(),
            });
        }

        let mut seen_ids: HashSet<&str> = HashSet::new();
        for (i, provider) in self.llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{i}].id"),
                    message: "provider id must not be empty".into(),
                });
            }

            if provider.kind == ProviderKind::Http {
                let base_url = provider.base_url.as_deref().unwrap_or("");
                if base_url.is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: format!("llm.providers[{i}].base_url"),
                        message: "http provider requires a base_url".into(),
                    });
                } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: format!("llm.providers[{i}].base_url"),
                        message: format!(
                            "base_url must start with http:// or https:// (got \"{base_url}\")"
                        ),
                    });
                }

                let needs_credentials =
                    matches!(provider.auth.mode, AuthMode::ApiKey | AuthMode::QueryParam);
                if needs_credentials {
                    let has_env = provider.auth.env.as_ref().is_some_and(|v| !v.is_empty());
                    let has_key = provider.auth.key.as_ref().is_some_and(|v| !v.is_empty());
                    let has_keys = !provider.auth.keys.is_empty();
                    if !has_env && !has_key && !has_keys {
                        errors.push(ConfigError {
                            severity: ConfigSeverity::Error,
                            field: format!("llm.providers[{i}].auth"),
                            message: format!(
                                "provider \"{}\" uses {:?} auth mode but has no auth.env, auth.key, or auth.keys configured",
                                provider.id, provider.auth.mode
                            ),
                        });
                    }
                }
            }

            if provider.kind == ProviderKind::Replay && provider.replay_recording.is_none() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{i}].replay_recording"),
                    message: "replay provider requires a replay_recording reference".into(),
                });
            }

            if !provider.id.is_empty() && !seen_ids.insert(&provider.id) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("llm.providers[{i}].id"),
                    message: format!(
                        "duplicate provider id \"{}\" — later provider will shadow earlier one",
                        provider.id
                    ),
                });
            }
        }

        // ── HTTP tool validation ──────────────────────────────────────
        for (i, tool) in self.tools.http.iter().enumerate() {
            if tool.name.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.http[{i}].name"),
                    message: "tool name must not be empty".into(),
                });
            }
            if tool.url_template.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.http[{i}].url_template"),
                    message: "url_template must not be empty".into(),
                });
            }
        }

        // ── MCP server validation ─────────────────────────────────────
        let mut seen_mcp_ids: HashSet<&str> = HashSet::new();
        for (i, server) in self.tools.mcp.servers.iter().enumerate() {
            if server.id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.mcp.servers[{i}].id"),
                    message: "server id must not be empty".into(),
                });
            }
            if server.id.contains(':') {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.mcp.servers[{i}].id"),
                    message: "server id must not contain ':' (used as tool name delimiter)".into(),
                });
            }
            if server.transport == McpTransportKind::Stdio && server.command.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.mcp.servers[{i}].command"),
                    message: "stdio transport requires a non-empty command".into(),
                });
            }
            if !server.id.is_empty() && !seen_mcp_ids.insert(&server.id) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.mcp.servers[{i}].id"),
                    message: format!("duplicate MCP server id \"{}\"", server.id),
                });
            }
            for key in server.env.keys() {
                if matches!(
                    key.as_str(),
                    "LD_PRELOAD" | "LD_LIBRARY_PATH" | "DYLD_INSERT_LIBRARIES"
                ) {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: format!("tools.mcp.servers[{i}].env.{key}"),
                        message: format!("overriding {key} is not permitted for security"),
                    });
                }
            }
        }

        // ── A2A agent validation ──────────────────────────────────────
        for (i, agent) in self.tools.a2a_agents.iter().enumerate() {
            if agent.agent_id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("tools.a2a_agents[{i}].agent_id"),
                    message: "agent_id must not be empty".into(),
                });
            }
            if agent.skills.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("tools.a2a_agents[{i}].skills"),
                    message: "agent has no skills; no tools will be exposed".into(),
                });
            }
        }

        // ── Context budget ─────────────────────────────────────────────
        if self.context_budget.strategy == TruncationStrategy::Summarize
            && self.context_budget.summarizer.is_none()
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "context_budget.summarizer".into(),
                message: "strategy \"summarize\" requires an explicit summarizer config".into(),
            });
        }

        // ── Execution ───────────────────────────────────────────────────
        if self.execution.worker_pool_size == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "execution.worker_pool_size".into(),
                message: "worker_pool_size must be greater than 0".into(),
            });
        }

        // ── Prompt registry ─────────────────────────────────────────────
        for (task_type, prompt) in &self.prompts.prompts {
            if prompt.system_template.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("prompts.prompts.{task_type}.system_template"),
                    message: "empty system template".into(),
                });
            }
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            llm: LlmConfig {
                providers: vec![ProviderConfig {
                    id: "openai".into(),
                    kind: ProviderKind::Http,
                    capabilities: Default::default(),
                    base_url: Some("https://api.openai.com/v1".into()),
                    auth: AuthConfig {
                        mode: AuthMode::ApiKey,
                        env: Some("OPENAI_API_KEY".into()),
                        ..AuthConfig::default()
                    },
                    default_model: None,
                    replay_recording: None,
                }],
                ..LlmConfig::default()
            },
            ..Config::default()
        }
    }

    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn valid_config_passes() {
        let issues = valid_config().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn no_providers_is_warning() {
        let mut cfg = valid_config();
        cfg.llm.providers.clear();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "llm.providers").expect("expected warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn http_provider_without_base_url_is_error() {
        let mut cfg = valid_config();
        cfg.llm.providers[0].base_url = None;
        let issues = cfg.validate();
        let issue =
            find_issue(&issues, "llm.providers[0].base_url").expect("expected base_url error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn http_provider_invalid_scheme_is_error() {
        let mut cfg = valid_config();
        cfg.llm.providers[0].base_url = Some("ws://localhost:1234".into());
        let issues = cfg.validate();
        assert!(find_issue(&issues, "llm.providers[0].base_url").is_some());
    }

    #[test]
    fn http_provider_no_credentials_is_error() {
        let mut cfg = valid_config();
        cfg.llm.providers[0].auth = AuthConfig {
            mode: AuthMode::ApiKey,
            env: None,
            key: None,
            keys: vec![],
            ..AuthConfig::default()
        };
        let issues = cfg.validate();
        assert!(find_issue(&issues, "llm.providers[0].auth").is_some());
    }

    #[test]
    fn mock_provider_needs_no_base_url_or_auth() {
        let mut cfg = valid_config();
        cfg.llm.providers[0] = ProviderConfig {
            id: "mock-1".into(),
            kind: ProviderKind::Mock,
            capabilities: Default::default(),
            base_url: None,
            auth: AuthConfig::default(),
            default_model: None,
            replay_recording: None,
        };
        let issues = cfg.validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty());
    }

    #[test]
    fn replay_provider_without_recording_is_error() {
        let mut cfg = valid_config();
        cfg.llm.providers[0] = ProviderConfig {
            id: "replay-1".into(),
            kind: ProviderKind::Replay,
            capabilities: Default::default(),
            base_url: None,
            auth: AuthConfig::default(),
            default_model: None,
            replay_recording: None,
        };
        let issues = cfg.validate();
        assert!(find_issue(&issues, "llm.providers[0].replay_recording").is_some());
    }

    #[test]
    fn duplicate_provider_ids_is_warning() {
        let mut cfg = valid_config();
        let mut second = cfg.llm.providers[0].clone();
        second.auth.env = Some("OPENAI_API_KEY_2".into());
        cfg.llm.providers.push(second);
        let issues = cfg.validate();
        let dup_issues: Vec<_> = issues
            .iter()
            .filter(|e| e.message.contains("duplicate provider id"))
            .collect();
        assert_eq!(dup_issues.len(), 1);
        assert_eq!(dup_issues[0].severity, ConfigSeverity::Warning);
    }

    #[test]
    fn mcp_server_id_with_colon_is_error() {
        let mut cfg = valid_config();
        cfg.tools.mcp.servers.push(McpServerConfig {
            id: "bad:id".into(),
            command: "npx".into(),
            args: vec![],
            transport: McpTransportKind::Stdio,
            url: None,
            env: Default::default(),
        });
        let issues = cfg.validate();
        assert!(find_issue(&issues, "tools.mcp.servers[0].id").is_some());
    }

    #[test]
    fn stdio_mcp_server_without_command_is_error() {
        let mut cfg = valid_config();
        cfg.tools.mcp.servers.push(McpServerConfig {
            id: "fs".into(),
            command: String::new(),
            args: vec![],
            transport: McpTransportKind::Stdio,
            url: None,
            env: Default::default(),
        });
        let issues = cfg.validate();
        assert!(find_issue(&issues, "tools.mcp.servers[0].command").is_some());
    }

    #[test]
    fn summarize_strategy_without_summarizer_is_error() {
        let mut cfg = valid_config();
        cfg.context_budget.strategy = TruncationStrategy::Summarize;
        cfg.context_budget.summarizer = None;
        let issues = cfg.validate();
        assert!(find_issue(&issues, "context_budget.summarizer").is_some());
    }

    #[test]
    fn zero_worker_pool_is_error() {
        let mut cfg = valid_config();
        cfg.execution.worker_pool_size = 0;
        let issues = cfg.validate();
        assert!(find_issue(&issues, "execution.worker_pool_size").is_some());
    }

    #[test]
    fn config_error_display_format() {
        let err = ConfigError {
            severity: ConfigSeverity::Error,
            field: "execution.worker_pool_size".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(
            format!("{err}"),
            "[ERROR] execution.worker_pool_size: must be greater than 0"
        );
    }
}
