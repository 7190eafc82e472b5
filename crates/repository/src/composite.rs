//! Composite repository (§4.9, §8 invariant 7): wraps an ordered list of
//! children. `save_results`/`save_summary` fan out to every child and
//! collect failures into a single composite error, preserving each
//! child's index; a slow or broken child never stops the others.

use std::sync::Arc;

use conductor_domain::error::{Error, Result};
use conductor_domain::run::{ResultSummary, RunResult};

use crate::repository::Repository;

pub struct CompositeRepository {
    children: Vec<Arc<dyn Repository>>,
}

impl CompositeRepository {
    pub fn new(children: Vec<Arc<dyn Repository>>) -> Self {
        Self { children }
    }

    fn composite_err(operation: &str, failures: Vec<(usize, String)>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Composite { operation: operation.to_string(), failures })
        }
    }
}

#[async_trait::async_trait]
impl Repository for CompositeRepository {
    async fn save_results(&self, batch: &[RunResult]) -> Result<()> {
        let mut failures = Vec::new();
        for (index, child) in self.children.iter().enumerate() {
            if let Err(e) = child.save_results(batch).await {
                failures.push((index, e.to_string()));
            }
        }
        Self::composite_err("save_results", failures)
    }

    async fn save_summary(&self, summary: &ResultSummary) -> Result<()> {
        let mut failures = Vec::new();
        for (index, child) in self.children.iter().enumerate() {
            if let Err(e) = child.save_summary(summary).await {
                failures.push((index, e.to_string()));
            }
        }
        Self::composite_err("save_summary", failures)
    }

    /// Consults children in order, returning the first success. Fails
    /// with an unsupported-operation error only if no child supports
    /// loading.
    async fn load_results(&self) -> Result<Vec<RunResult>> {
        for child in &self.children {
            match child.load_results().await {
                Ok(batch) => return Ok(batch),
                Err(Error::UnsupportedOperation(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::UnsupportedOperation("no child repository supports loading results".into()))
    }

    fn supports_streaming(&self) -> bool {
        self.children.iter().any(|c| c.supports_streaming())
    }

    async fn save_result(&self, result: &RunResult) -> Result<()> {
        let mut failures = Vec::new();
        for (index, child) in self.children.iter().enumerate() {
            if !child.supports_streaming() {
                continue;
            }
            if let Err(e) = child.save_result(result).await {
                failures.push((index, e.to_string()));
            }
        }
        Self::composite_err("save_result", failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonRepository;
    use chrono::Utc;

    fn sample_result() -> RunResult {
        let now = Utc::now();
        RunResult {
            run_id: "r1".into(),
            prompt_pack: "default".into(),
            scenario_id: "s1".into(),
            provider_id: "mock".into(),
            region: None,
            start_time: now,
            end_time: now,
            duration_ms: 5,
            cost: None,
            error: String::new(),
            violations: Vec::new(),
            recording_ref: None,
        }
    }

    #[tokio::test]
    async fn partial_failure_preserves_child_index_and_writes_good_child() {
        let dir = tempfile::tempdir().unwrap();
        let ok_path = dir.path().join("ok.json");
        let bad_path = std::path::PathBuf::from("/forbidden/nested/ro.json");

        let composite = CompositeRepository::new(vec![
            Arc::new(JsonRepository::new(&ok_path)),
            Arc::new(JsonRepository::new(&bad_path)),
        ]);

        let err = composite.save_results(&[sample_result()]).await.unwrap_err();
        match err {
            Error::Composite { operation, failures } => {
                assert_eq!(operation, "save_results");
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, 1);
            }
            other => panic!("expected composite error, got {other:?}"),
        }

        assert!(ok_path.exists());
    }

    #[tokio::test]
    async fn load_results_returns_first_supporting_child() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.json");
        let repo = JsonRepository::new(&path);
        repo.save_results(&[sample_result()]).await.unwrap();

        let composite = CompositeRepository::new(vec![Arc::new(repo)]);
        let loaded = composite.load_results().await.unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
