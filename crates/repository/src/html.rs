//! HTML result repository (§4.9): a human-readable report with a summary
//! header and a per-run drill-down table. Write-only.

use std::path::PathBuf;

use conductor_domain::error::{Error, Result};
use conductor_domain::run::{ResultSummary, RunResult};

use crate::repository::Repository;

pub struct HtmlRepository {
    path: PathBuf,
}

impl HtmlRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render(batch: &[RunResult]) -> String {
    let passed = batch.iter().filter(|r| r.passed()).count();
    let failed = batch.len() - passed;

    let mut rows = String::new();
    for result in batch {
        let status = if result.passed() { "pass" } else { "fail" };
        let detail = if result.error.is_empty() {
            result
                .violations
                .iter()
                .map(|v| format!("{}: {}", v.assertion_type, v.detail))
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            result.error.clone()
        };
        rows.push_str(&format!(
            "<tr class=\"{status}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}ms</td><td>{}</td></tr>\n",
            escape_html(&result.run_id),
            escape_html(&result.scenario_id),
            escape_html(&result.provider_id),
            status,
            result.duration_ms,
            escape_html(&detail),
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>conductor results</title>\n\
<style>body{{font-family:sans-serif}} .fail{{background:#fdd}} .pass{{background:#dfd}}</style>\n\
</head><body>\n<h1>conductor results</h1>\n<p>{passed} passed, {failed} failed, {total} total</p>\n\
<table border=\"1\" cellpadding=\"4\"><thead><tr><th>run</th><th>scenario</th><th>provider</th><th>status</th><th>duration</th><th>detail</th></tr></thead>\n\
<tbody>\n{rows}</tbody></table>\n</body></html>\n",
        total = batch.len(),
    )
}

#[async_trait::async_trait]
impl Repository for HtmlRepository {
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
        Err(Error::UnsupportedOperation("HtmlRepository does not support loading results".into()))
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn save_result(&self, _result: &RunResult) -> Result<()> {
        Err(Error::UnsupportedOperation("HtmlRepository does not support streaming single results".into()))
    }
}
