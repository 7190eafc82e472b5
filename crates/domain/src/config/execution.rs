use serde::{Deserialize, Serialize};

/// Run-level concurrency and pipeline execution defaults (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Bounded worker pool size for the executor.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: u32,
    /// Per-pipeline execution timeout; `0` disables it (required for
    /// long-lived duplex audio sessions).
    #[serde(default = "default_pipeline_timeout_ms")]
    pub pipeline_timeout_ms: u64,
    /// Channel depth between streaming-mode stages.
    #[serde(default = "default_channel_depth")]
    pub stage_channel_depth: usize,
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Demote validation failures to warnings instead of surfacing them as
    /// `RunResult` violations (§4.1 step 7, §7: validation is the one
    /// error category allowed to demote this way).
    #[serde(default)]
    pub suppress_validation: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            pipeline_timeout_ms: default_pipeline_timeout_ms(),
            stage_channel_depth: default_channel_depth(),
            recording: RecordingConfig::default(),
            suppress_validation: false,
        }
    }
}

fn default_worker_pool_size() -> u32 {
    4
}

fn default_pipeline_timeout_ms() -> u64 {
    120_000
}

fn default_channel_depth() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_recording_dir")]
    pub directory: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_recording_dir(),
        }
    }
}

fn default_recording_dir() -> String {
    "./recordings".into()
}
