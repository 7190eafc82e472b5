//! Pure aggregation of a run batch into a [`ResultSummary`] (§4.9, §8
//! invariant 2: `passed + failed == total_tests`). Validates the batch's
//! identifying fields up front so a malformed batch fails fast with a
//! typed error instead of producing a summary nobody can trust.

use std::collections::HashSet;

use conductor_domain::error::{Error, Result};
use conductor_domain::run::{ResultSummary, RunResult};

/// Build a [`ResultSummary`] from a batch of results. Every result must
/// carry a non-empty `run_id`, `scenario_id`, and `provider_id`.
pub fn build_summary(batch: &[RunResult]) -> Result<ResultSummary> {
    for (index, result) in batch.iter().enumerate() {
        if result.run_id.trim().is_empty() {
            return Err(Error::Other(format!("batch entry {index} has an empty run_id")));
        }
        if result.scenario_id.trim().is_empty() {
            return Err(Error::Other(format!("batch entry {index} has an empty scenario_id")));
        }
        if result.provider_id.trim().is_empty() {
            return Err(Error::Other(format!("batch entry {index} has an empty provider_id")));
        }
    }

    let total_tests = batch.len();
    let passed = batch.iter().filter(|r| r.passed()).count();
    let failed = total_tests - passed;

    let total_cost: f64 = batch.iter().filter_map(|r| r.cost.map(|c| c.total_cost)).sum();
    let total_tokens: u64 = batch
        .iter()
        .filter_map(|r| r.cost.map(|c| (c.input_tokens + c.output_tokens) as u64))
        .sum();
    let total_duration_ms: i64 = batch.iter().map(|r| r.duration_ms).sum();
    let average_cost = if total_tests > 0 { total_cost / total_tests as f64 } else { 0.0 };

    let mut run_ids: Vec<String> = batch.iter().map(|r| r.run_id.clone()).collect();
    run_ids.sort();

    let packs = unique_sorted(batch.iter().map(|r| r.prompt_pack.clone()));
    let scenarios = unique_sorted(batch.iter().map(|r| r.scenario_id.clone()));
    let providers = unique_sorted(batch.iter().map(|r| r.provider_id.clone()));
    let regions = unique_sorted(batch.iter().filter_map(|r| r.region.clone()));

    Ok(ResultSummary {
        total_tests,
        passed,
        failed,
        total_cost,
        average_cost,
        total_tokens,
        total_duration_ms,
        generated_at: None,
        config_path: None,
        git_sha: None,
        ci_metadata: std::collections::HashMap::new(),
        run_ids,
        packs,
        scenarios,
        providers,
        regions,
    })
}

fn unique_sorted(values: impl Iterator<Item = String>) -> Vec<String> {
    let set: HashSet<String> = values.collect();
    let mut out: Vec<String> = set.into_iter().collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conductor_domain::run::CostInfo;

    fn result(run_id: &str, passed: bool) -> RunResult {
        let now = Utc::now();
        RunResult {
            run_id: run_id.into(),
            prompt_pack: "default".into(),
            scenario_id: "s1".into(),
            provider_id: "mock".into(),
            region: None,
            start_time: now,
            end_time: now,
            duration_ms: 10,
            cost: Some(CostInfo { input_tokens: 10, output_tokens: 5, total_cost: 0.01 }),
            error: if passed { String::new() } else { "boom".into() },
            violations: Vec::new(),
            recording_ref: None,
        }
    }

    #[test]
    fn passed_plus_failed_equals_total() {
        let batch = vec![result("r1", true), result("r2", false), result("r3", true)];
        let summary = build_summary(&batch).unwrap();
        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.passed + summary.failed, summary.total_tests);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn aggregates_cost_and_tokens() {
        let batch = vec![result("r1", true), result("r2", true)];
        let summary = build_summary(&batch).unwrap();
        assert!((summary.total_cost - 0.02).abs() < 1e-9);
        assert_eq!(summary.total_tokens, 30);
    }

    #[test]
    fn rejects_empty_run_id() {
        let mut bad = result("r1", true);
        bad.run_id = String::new();
        let err = build_summary(&[bad]).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }
}
