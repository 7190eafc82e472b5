use super::mcp::McpConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool registry configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Static definitions for the tool registry. Local handlers are always
/// registered in-process by the CLI wiring (a name + schema here plus a
/// callable supplied at startup); HTTP/A2A/MCP executors are fully
/// data-driven and need no code to add one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub local: Vec<LocalToolConfig>,
    #[serde(default)]
    pub http: Vec<HttpToolConfig>,
    #[serde(default)]
    pub a2a_agents: Vec<A2aAgentConfig>,
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Descriptor for a locally-registered tool. The callable itself is
/// supplied at startup (name must match one registered in-process).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default = "default_schema")]
    pub parameters: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// An HTTP-backed tool: argument values are substituted into URL/header/
/// body templates (`{{arg_name}}`) before the request is issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_schema")]
    pub parameters: serde_json::Value,
    pub url_template: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers_template: HashMap<String, String>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_method() -> String {
    "POST".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// An agent bridged in over A2A: each configured skill becomes a tool
/// named `a2a__<agent_id>__<skill_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aAgentConfig {
    pub agent_id: String,
    pub base_url: String,
    pub skills: Vec<A2aSkillConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aSkillConfig {
    pub skill_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_schema")]
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_tool_defaults_to_post() {
        let json = r#"{"name": "lookup", "url_template": "https://x/{{id}}"}"#;
        let tool: HttpToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(tool.method, "POST");
        assert_eq!(tool.timeout_ms, 30_000);
    }

    #[test]
    fn a2a_tool_name_convention() {
        let agent = A2aAgentConfig {
            agent_id: "planner".into(),
            base_url: "http://localhost:9000".into(),
            skills: vec![A2aSkillConfig {
                skill_id: "decompose".into(),
                description: String::new(),
                parameters: default_schema(),
            }],
        };
        let tool_name = format!(
            "a2a__{}__{}",
            agent.agent_id, agent.skills[0].skill_id
        );
        assert_eq!(tool_name, "a2a__planner__decompose");
    }
}
