use crate::assertion::ValidationError;
use crate::recording::RecordingRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in an enumerated run plan: a scenario × provider × prompt
/// combination that survived capability gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub run_id: String,
    pub prompt_pack: String,
    pub scenario_id: String,
    pub provider_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// The enumerated cross-product of {prompt config} × {provider} × {scenario},
/// filtered by capability requirements and any explicit filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunPlan {
    pub entries: Vec<RunDescriptor>,
}

impl RunPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Token/cost accounting captured from a provider's response, when the
/// provider reports usage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostInfo {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_cost: f64,
}

/// The outcome of executing one run. `error` is the empty string on
/// success (§8 S1: `Error == ""`), never absent, so repositories can
/// serialize a stable shape regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub prompt_pack: String,
    pub scenario_id: String,
    pub provider_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostInfo>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub violations: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_ref: Option<RecordingRef>,
}

impl RunResult {
    /// §8 invariant 1/2: passed iff no error text and no violations.
    pub fn passed(&self) -> bool {
        self.error.is_empty() && self.violations.is_empty()
    }
}

impl From<&RunDescriptor> for RunResultBuilder {
    fn from(d: &RunDescriptor) -> Self {
        RunResultBuilder {
            run_id: d.run_id.clone(),
            prompt_pack: d.prompt_pack.clone(),
            scenario_id: d.scenario_id.clone(),
            provider_id: d.provider_id.clone(),
            region: d.region.clone(),
        }
    }
}

/// Convenience builder so a worker can start a `RunResult` from the
/// descriptor it's executing and fill in the rest as the run progresses.
pub struct RunResultBuilder {
    run_id: String,
    prompt_pack: String,
    scenario_id: String,
    provider_id: String,
    region: Option<String>,
}

impl RunResultBuilder {
    pub fn finish(
        self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        cost: Option<CostInfo>,
        error: String,
        violations: Vec<ValidationError>,
        recording_ref: Option<RecordingRef>,
    ) -> RunResult {
        RunResult {
            run_id: self.run_id,
            prompt_pack: self.prompt_pack,
            scenario_id: self.scenario_id,
            provider_id: self.provider_id,
            region: self.region,
            start_time,
            end_time,
            duration_ms: (end_time - start_time).num_milliseconds(),
            cost,
            error,
            violations,
            recording_ref,
        }
    }
}

/// Aggregate over a batch of run results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_cost: f64,
    pub average_cost: f64,
    pub total_tokens: u64,
    pub total_duration_ms: i64,
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    #[serde(default)]
    pub ci_metadata: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub run_ids: Vec<String>,
    #[serde(default)]
    pub packs: Vec<String>,
    #[serde(default)]
    pub scenarios: Vec<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}
