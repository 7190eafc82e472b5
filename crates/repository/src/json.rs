//! JSON result repository (§4.9, §8 S5): a faithful structured dump of a
//! `RunResult` batch plus its `ResultSummary` to a single file.

use std::path::PathBuf;

use conductor_domain::error::{Error, Result};
use conductor_domain::run::{ResultSummary, RunResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::repository::Repository;

#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    results: Vec<RunResult>,
    #[serde(default)]
    summary: Option<ResultSummary>,
}

/// Writes to `path`, replacing its prior contents on every save. Does not
/// support single-result streaming — a JSON dump is only coherent once
/// the whole batch is known.
pub struct JsonRepository {
    path: PathBuf,
    state: Mutex<JsonDocument>,
}

impl JsonRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(JsonDocument { results: Vec::new(), summary: None }),
        }
    }

    async fn flush(&self) -> Result<()> {
        let content = {
            let state = self.state.lock();
            serde_json::to_string_pretty(&*state)?
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        tokio::fs::write(&self.path, content).await.map_err(Error::Io)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for JsonRepository {
    async fn save_results(&self, batch: &[RunResult]) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.results = batch.to_vec();
        }
        self.flush().await
    }

    async fn save_summary(&self, summary: &ResultSummary) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.summary = Some(summary.clone());
        }
        self.flush().await
    }

    async fn load_results(&self) -> Result<Vec<RunResult>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(Error::Io)?;
        let doc: JsonDocument = serde_json::from_str(&content)?;
        Ok(doc.results)
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn save_result(&self, _result: &RunResult) -> Result<()> {
        Err(Error::UnsupportedOperation("JsonRepository does not support streaming single results".into()))
    }
}
