use std::time::Duration;

use async_trait::async_trait;
use conductor_domain::config::HttpToolConfig;
use conductor_domain::error::{Error, Result};

use crate::executor::ToolExecutor;

/// Executes an HTTP-backed tool: substitutes call arguments into the
/// configured URL/header/body templates (`{{arg_name}}`), issues the
/// request, and returns the response body as a string.
pub struct HttpExecutor {
    config: HttpToolConfig,
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(config: HttpToolConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn substitute(template: &str, arguments: &serde_json::Value) -> String {
        let mut out = template.to_string();
        if let Some(obj) = arguments.as_object() {
            for (key, value) in obj {
                let needle = format!("{{{{{key}}}}}");
                let replacement = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out = out.replace(&needle, &replacement);
            }
        }
        out
    }
}

#[async_trait]
impl ToolExecutor for HttpExecutor {
    async fn execute(&self, arguments: serde_json::Value) -> Result<String> {
        let url = Self::substitute(&self.config.url_template, &arguments);
        let method = reqwest::Method::from_bytes(self.config.method.as_bytes())
            .map_err(|e| Error::ToolExecution {
                tool_name: self.config.name.clone(),
                message: format!("invalid HTTP method '{}': {e}", self.config.method),
            })?;

        let mut builder = self.client.request(method, &url);

        for (header_name, header_template) in &self.config.headers_template {
            builder = builder.header(header_name, Self::substitute(header_template, &arguments));
        }

        if let Some(body_template) = &self.config.body_template {
            builder = builder.body(Self::substitute(body_template, &arguments));
        }

        let response = builder.send().await.map_err(|e| Error::ToolExecution {
            tool_name: self.config.name.clone(),
            message: format!("request failed: {e}"),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::ToolExecution {
            tool_name: self.config.name.clone(),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(Error::ToolExecution {
                tool_name: self.config.name.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        Ok(body)
    }
}
