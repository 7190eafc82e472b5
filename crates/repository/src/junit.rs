//! JUnit XML result repository (§4.9): one `<testcase>` per run, with
//! assertion violations rendered as `<failure>` elements, for CI
//! integration. Write-only — JUnit is a reporting format, not a
//! round-trippable store.

use std::path::PathBuf;

use conductor_domain::error::{Error, Result};
use conductor_domain::run::{ResultSummary, RunResult};

use crate::repository::Repository;

pub struct JunitRepository {
    path: PathBuf,
}

impl JunitRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn render(batch: &[RunResult]) -> String {
    let total = batch.len();
    let failures = batch.iter().filter(|r| !r.passed()).count();
    let total_time_s: f64 = batch.iter().map(|r| r.duration_ms as f64 / 1000.0).sum();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<testsuite name=\"conductor\" tests=\"{total}\" failures=\"{failures}\" time=\"{total_time_s:.3}\">\n"
    ));

    for result in batch {
        let name = format!("{}::{}", result.scenario_id, result.provider_id);
        let time_s = result.duration_ms as f64 / 1000.0;
        out.push_str(&format!(
            "  <testcase classname=\"{}\" name=\"{}\" time=\"{:.3}\">\n",
            escape_xml(&result.prompt_pack),
            escape_xml(&name),
            time_s
        ));

        if !result.error.is_empty() {
            out.push_str(&format!(
                "    <failure message=\"{}\">{}</failure>\n",
                escape_xml(&result.error),
                escape_xml(&result.error)
            ));
        }
        for violation in &result.violations {
            out.push_str(&format!(
                "    <failure message=\"{}\">{}</failure>\n",
                escape_xml(&violation.assertion_type),
                escape_xml(&violation.detail)
            ));
        }

        out.push_str("  </testcase>\n");
    }

    out.push_str("</testsuite>\n");
    out
}

#[async_trait::async_trait]
impl Repository for JunitRepository {
    async fn save_results(&self, batch: &[RunResult]) -> Result<()> {
        let content = render(batch);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        tokio::fs::write(&self.path, content).await.map_err(Error::Io)?;
        Ok(())
    }

    async fn save_summary(&self, _summary: &ResultSummary) -> Result<()> {
        Ok(())
    }

    async fn load_results(&self) -> Result<Vec<RunResult>> {
        Err(Error::UnsupportedOperation("JunitRepository does not support loading results".into()))
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn save_result(&self, _result: &RunResult) -> Result<()> {
        Err(Error::UnsupportedOperation("JunitRepository does not support streaming single results".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conductor_domain::assertion::{Assertion, AssertionScope, ValidationError};

    fn failing_result() -> RunResult {
        let now = Utc::now();
        RunResult {
            run_id: "r1".into(),
            prompt_pack: "default".into(),
            scenario_id: "s1".into(),
            provider_id: "mock".into(),
            region: None,
            start_time: now,
            end_time: now,
            duration_ms: 12,
            cost: None,
            error: String::new(),
            violations: vec![ValidationError::new(
                &Assertion::ContentNotEmpty,
                AssertionScope::Turn,
                "response was empty",
            )],
            recording_ref: None,
        }
    }

    #[tokio::test]
    async fn renders_testcase_with_failure_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junit.xml");
        let repo = JunitRepository::new(&path);
        repo.save_results(&[failing_result()]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("<testsuite"));
        assert!(content.contains("failures=\"1\""));
        assert!(content.contains("response was empty"));
    }

    #[test]
    fn escapes_xml_special_characters() {
        assert_eq!(escape_xml("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
