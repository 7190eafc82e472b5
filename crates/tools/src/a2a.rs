use async_trait::async_trait;
use conductor_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::executor::ToolExecutor;

/// Bridges a single A2A agent skill in as a tool. Tools of this kind are
/// named `a2a__<agent_id>__<skill_id>` by the registry that constructs
/// them — the executor itself only needs the skill id and the agent's
/// base URL to issue the call.
pub struct A2aExecutor {
    agent_id: String,
    skill_id: String,
    base_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl A2aExecutor {
    pub fn new(agent_id: impl Into<String>, skill_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            skill_id: skill_id.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[derive(Serialize)]
struct A2aRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: A2aParams,
}

#[derive(Serialize)]
struct A2aParams {
    #[serde(rename = "skillId")]
    skill_id: String,
    message: A2aMessage,
}

#[derive(Serialize)]
struct A2aMessage {
    role: &'static str,
    parts: Vec<A2aPart>,
}

#[derive(Serialize)]
struct A2aPart {
    #[serde(rename = "type")]
    part_type: &'static str,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct A2aResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<A2aError>,
}

#[derive(Deserialize)]
struct A2aError {
    message: String,
}

#[async_trait]
impl ToolExecutor for A2aExecutor {
    async fn execute(&self, arguments: serde_json::Value) -> Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = A2aRequest {
            jsonrpc: "2.0",
            id,
            method: "message/send",
            params: A2aParams {
                skill_id: self.skill_id.clone(),
                message: A2aMessage {
                    role: "user",
                    parts: vec![A2aPart {
                        part_type: "data",
                        data: arguments,
                    }],
                },
            },
        };

        let tool_name = format!("a2a__{}__{}", self.agent_id, self.skill_id);

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ToolExecution {
                tool_name: tool_name.clone(),
                message: format!("request to agent '{}' failed: {e}", self.agent_id),
            })?;

        let parsed: A2aResponse = response.json().await.map_err(|e| Error::ToolExecution {
            tool_name: tool_name.clone(),
            message: format!("invalid A2A response from agent '{}': {e}", self.agent_id),
        })?;

        if let Some(err) = parsed.error {
            return Err(Error::ToolExecution {
                tool_name,
                message: format!("agent '{}' returned an error: {}", self.agent_id, err.message),
            });
        }

        let result = parsed.result.unwrap_or(json!(null));
        Ok(result.to_string())
    }
}
