use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use conductor_domain::conversation::StreamElement;
use conductor_domain::error::{Error, Result};

use crate::stage::{keys, Stage, StageContext};

fn placeholder_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").unwrap())
}

/// A single linear pass of `{{name}}` expansion. A placeholder with no
/// matching variable is left literal (with a warning) rather than
/// silently dropped — surfacing a misconfigured template beats hiding it
/// (§4.8).
pub fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(placeholder = %name, "unresolved template placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Looks up the task-type prompt config and assembles the system prompt
/// (§4.1 step 3). Assumes [`super::variable_provider::VariableProviderStage`]
/// has already populated `metadata[VARIABLES]`.
pub struct PromptAssemblyStage;

#[async_trait]
impl Stage for PromptAssemblyStage {
    fn name(&self) -> &str {
        "prompt_assembly"
    }

    async fn process(&self, mut element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let prompt_config = ctx.services.prompts.prompts.get(&ctx.run.task_type).ok_or_else(|| {
            Error::Config(format!(
                "no prompt configured for task_type \"{}\"",
                ctx.run.task_type
            ))
        })?;

        let variables: HashMap<String, String> = element
            .metadata
            .get(keys::VARIABLES)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let system_prompt = substitute(&prompt_config.system_template, &variables);

        element
            .metadata
            .insert(keys::SYSTEM_PROMPT.into(), serde_json::Value::String(system_prompt));
        element.metadata.insert(
            keys::ALLOWED_TOOLS.into(),
            serde_json::to_value(&prompt_config.allowed_tools).unwrap_or_default(),
        );
        Ok(vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholder() {
        let mut vars = HashMap::new();
        vars.insert("persona".into(), "support agent".into());
        let out = substitute("You are a {{persona}}.", &vars);
        assert_eq!(out, "You are a support agent.");
    }

    #[test]
    fn leaves_unresolved_placeholder_literal() {
        let out = substitute("Hello {{missing}}!", &HashMap::new());
        assert_eq!(out, "Hello {{missing}}!");
    }

    #[test]
    fn single_pass_does_not_recursively_expand() {
        let mut vars = HashMap::new();
        vars.insert("outer".into(), "{{inner}}".into());
        vars.insert("inner".into(), "leaked".into());
        let out = substitute("{{outer}}", &vars);
        assert_eq!(out, "{{inner}}");
    }
}
