//! Run plan construction (§4.2): the cross-product of {prompt pack} ×
//! {provider} × {scenario}, filtered by an optional explicit selection and
//! by each provider's advertised capabilities.

use std::collections::HashMap;

use conductor_domain::run::{RunDescriptor, RunPlan};
use conductor_domain::scenario::Scenario;
use conductor_domain::trace::TraceEvent;
use conductor_providers::registry::ProviderRegistry;

/// An optional narrowing of which scenarios/providers/regions to plan.
/// `None` means "no restriction on this axis". An empty `Some(vec![])`
/// restricts to nothing, which is a legitimate (if useless) filter rather
/// than being treated the same as `None`.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    pub scenarios: Option<Vec<String>>,
    pub providers: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
}

impl PlanFilter {
    fn allows_scenario(&self, id: &str) -> bool {
        match &self.scenarios {
            None => true,
            Some(ids) => ids.iter().any(|s| s == id),
        }
    }

    fn allows_provider(&self, id: &str) -> bool {
        match &self.providers {
            None => true,
            Some(ids) => ids.iter().any(|p| p == id),
        }
    }

    fn allows_region(&self, region: Option<&str>) -> bool {
        match (&self.regions, region) {
            (None, _) => true,
            (Some(regions), Some(r)) => regions.iter().any(|x| x == r),
            (Some(_), None) => false,
        }
    }
}

/// Build the run plan: every `(prompt pack, provider, scenario)` triple
/// that passes `filter` and whose provider advertises every capability
/// the scenario requires (§8 invariant 3). Combinations dropped for
/// missing capabilities are logged via `TraceEvent::CapabilityGated`
/// rather than silently omitted.
///
/// `prompt_packs`, when non-empty, is the explicit set of prompt-registry
/// keys to cross every scenario against. When empty, each scenario is
/// planned against exactly one pack: its own `task_type` — the plan's
/// prompt axis collapses to today's one-pack-per-scenario behavior unless
/// the caller opts into testing a scenario against other registry
/// entries.
///
/// Regions are not modeled anywhere else in the domain (no per-provider
/// region list exists); a planned entry's region is always `None` unless
/// a future caller extends `Scenario`/`ProviderConfig` with one. The
/// filter's region axis is honored regardless, so it composes cleanly
/// once that happens.
pub fn plan(scenarios: &[Scenario], providers: &ProviderRegistry, prompt_packs: &[String], filter: &PlanFilter) -> RunPlan {
    let mut entries = Vec::new();
    let mut dropped = 0usize;
    let mut seq: HashMap<String, u32> = HashMap::new();

    let mut provider_ids = providers.list_providers();
    provider_ids.sort();

    for scenario in scenarios {
        if !filter.allows_scenario(&scenario.id) {
            continue;
        }

        let packs: Vec<String> = if prompt_packs.is_empty() {
            vec![scenario.task_type.clone()]
        } else {
            prompt_packs.to_vec()
        };

        for provider_id in &provider_ids {
            if !filter.allows_provider(provider_id) {
                continue;
            }
            if !filter.allows_region(None) {
                continue;
            }

            let provider = match providers.get(provider_id) {
                Some(p) => p,
                None => continue,
            };

            let missing = provider.capabilities().missing(&scenario.required_capabilities);
            if !missing.is_empty() {
                TraceEvent::CapabilityGated {
                    scenario_id: scenario.id.clone(),
                    provider_id: provider_id.clone(),
                    missing: missing.iter().map(|c| c.to_string()).collect(),
                }
                .emit();
                dropped += packs.len();
                continue;
            }

            for pack in &packs {
                let base = format!("{}__{}", scenario.id, provider_id);
                let index = seq.entry(base.clone()).or_insert(0);
                let run_id = format!("{base}__{index}");
                *index += 1;

                entries.push(RunDescriptor {
                    run_id,
                    prompt_pack: pack.clone(),
                    scenario_id: scenario.id.clone(),
                    provider_id: provider_id.clone(),
                    region: None,
                });
            }
        }
    }

    TraceEvent::PlanBuilt {
        total_runs: entries.len(),
        dropped,
    }
    .emit();

    RunPlan { entries }
}
