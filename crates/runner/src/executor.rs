//! Run execution (§4.2): drives each entry of a [`RunPlan`] through a
//! fresh pipeline, one per run, over a bounded worker pool. Turns within
//! a run are played strictly sequentially; runs share no mutable state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use conductor_assertions::evaluator::{evaluate, EvalContext, EvalInput};
use conductor_domain::assertion::{AssertionScope, ValidationError};
use conductor_domain::config::ExecutionConfig;
use conductor_domain::conversation::{ConversationState, ExecutionContext};
use conductor_domain::error::Result;
use conductor_domain::message::{Message, Role};
use conductor_domain::recording::RecordingRef;
use conductor_domain::run::{CostInfo, RunDescriptor, RunPlan, RunResult, RunResultBuilder};
use conductor_domain::scenario::{Scenario, Turn};
use conductor_domain::trace::TraceEvent;
use conductor_pipeline::builder::PipelineBuilder;
use conductor_pipeline::cancel::CancelToken;
use conductor_pipeline::services::PipelineServices;
use conductor_pipeline::stage::{keys, RunContext, StageContext};
use conductor_pipeline::sync_exec::run_sync;
use conductor_recording::event::RecordingEvent;
use conductor_recording::writer::SessionRecorder;
use conductor_repository::repository::Repository;
use conductor_repository::summary::build_summary;

/// Drives a whole [`RunPlan`] to completion. Owns the read-only services
/// every per-run pipeline shares, the scenario set the plan's descriptors
/// index into, and the repository results are forwarded to.
pub struct Executor {
    services: Arc<PipelineServices>,
    scenarios: HashMap<String, Scenario>,
    repository: Arc<dyn Repository>,
    execution: ExecutionConfig,
}

impl Executor {
    pub fn new(
        services: Arc<PipelineServices>,
        scenarios: Vec<Scenario>,
        repository: Arc<dyn Repository>,
        execution: ExecutionConfig,
    ) -> Self {
        let scenarios = scenarios.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            services,
            scenarios,
            repository,
            execution,
        }
    }

    /// Execute every entry in `plan`, returning one [`RunResult`] per
    /// entry in plan order. A run that fails internally (unknown
    /// scenario, pipeline error, worker panic) never aborts the others —
    /// it's captured as an errored `RunResult` instead (§4.2 failure
    /// semantics). Always writes the final batch and summary to the
    /// repository, streaming individual results first when the
    /// repository supports it.
    pub async fn run_plan(&self, plan: &RunPlan) -> Result<Vec<RunResult>> {
        let semaphore = Arc::new(Semaphore::new(self.execution.worker_pool_size.max(1) as usize));
        let mut handles = Vec::with_capacity(plan.entries.len());

        for descriptor in &plan.entries {
            let semaphore = Arc::clone(&semaphore);
            let services = Arc::clone(&self.services);
            let execution = self.execution.clone();
            let scenario = self.scenarios.get(&descriptor.scenario_id).cloned();
            let descriptor = descriptor.clone();

            handles.push((
                descriptor.clone(),
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                    run_one(&descriptor, scenario, services, execution).await
                }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (descriptor, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => errored_result(&descriptor, format!("worker panicked: {join_err}")),
            };

            TraceEvent::RunCompleted {
                run_id: result.run_id.clone(),
                duration_ms: result.duration_ms,
                passed: result.passed(),
            }
            .emit();
            if !result.passed() && !result.error.is_empty() {
                TraceEvent::RunFailed {
                    run_id: result.run_id.clone(),
                    error: result.error.clone(),
                }
                .emit();
            }

            if self.repository.supports_streaming() {
                if let Err(e) = self.repository.save_result(&result).await {
                    TraceEvent::RepositorySaveFailed {
                        repository: "streaming".into(),
                        error: e.to_string(),
                    }
                    .emit();
                }
            }

            results.push(result);
        }

        match self.repository.save_results(&results).await {
            Ok(()) => TraceEvent::RepositorySaveCompleted {
                repository: "batch".into(),
                count: results.len(),
            }
            .emit(),
            Err(e) => TraceEvent::RepositorySaveFailed {
                repository: "batch".into(),
                error: e.to_string(),
            }
            .emit(),
        }

        let summary = build_summary(&results)?;
        self.repository.save_summary(&summary).await?;

        Ok(results)
    }
}

/// Runs one descriptor end to end. Never returns `Err` — any internal
/// failure is folded into the returned `RunResult.error` so one run's
/// failure never aborts the plan.
async fn run_one(
    descriptor: &RunDescriptor,
    scenario: Option<Scenario>,
    services: Arc<PipelineServices>,
    execution: ExecutionConfig,
) -> RunResult {
    let start_time = Utc::now();

    TraceEvent::RunStarted {
        run_id: descriptor.run_id.clone(),
        scenario_id: descriptor.scenario_id.clone(),
        provider_id: descriptor.provider_id.clone(),
    }
    .emit();

    let scenario = match scenario {
        Some(s) => s,
        None => {
            return errored_result(
                descriptor,
                format!("no scenario registered with id \"{}\"", descriptor.scenario_id),
            )
        }
    };

    match execute_scenario(descriptor, &scenario, &services, &execution, start_time).await {
        Ok(result) => result,
        Err(e) => errored_result(descriptor, e.to_string()),
    }
}

async fn execute_scenario(
    descriptor: &RunDescriptor,
    scenario: &Scenario,
    services: &Arc<PipelineServices>,
    execution: &ExecutionConfig,
    start_time: chrono::DateTime<Utc>,
) -> Result<RunResult> {
    let pipeline = PipelineBuilder::standard(&services.context_budget).build();
    let stage_ctx = StageContext {
        run: RunContext {
            run_id: descriptor.run_id.clone(),
            conversation_id: descriptor.run_id.clone(),
            task_type: descriptor.prompt_pack.clone(),
            provider_id: descriptor.provider_id.clone(),
            tool_policy: scenario.tool_policy.clone(),
            suppress_validation: execution.suppress_validation,
        },
        cancel: CancelToken::new(),
        services: Arc::clone(services),
    };

    let variables = fixtures_as_variables(scenario);

    let mut recorder = if execution.recording.enabled {
        let mut r = SessionRecorder::new(descriptor.run_id.clone(), start_time).with_provider(descriptor.provider_id.clone(), None);
        r.record(RecordingEvent::ConversationStarted {
            timestamp: start_time,
            conversation_id: descriptor.run_id.clone(),
        });
        Some(r)
    } else {
        None
    };

    let mut conversation_state: Option<serde_json::Value> = None;
    let mut violations: Vec<ValidationError> = Vec::new();
    let mut total_cost = CostInfo::default();
    let mut any_cost = false;

    for turn in &scenario.turns {
        if !matches!(turn.role, Role::User) {
            // Scripted non-user turns seed context without invoking the
            // provider — there's no second model in this engine to drive
            // a persona's generated content for self-play turns yet. They
            // still have to land in the conversation state the pipeline
            // carries forward (§4.2 step 3: every turn is played in order),
            // not just a throwaway local list, or the next user turn's
            // request and the final conversation-level assertion pass both
            // lose them.
            append_scripted_turn(&mut conversation_state, &descriptor.run_id, turn)?;
            continue;
        }

        let mut metadata = HashMap::new();
        metadata.insert(keys::VARIABLES.to_string(), serde_json::to_value(&variables)?);
        metadata.insert(keys::TURN_ASSERTIONS.to_string(), serde_json::to_value(&turn.assertions)?);
        if let Some(state) = &conversation_state {
            metadata.insert(keys::CONVERSATION_STATE.to_string(), state.clone());
        }

        let input = ExecutionContext {
            messages: vec![turn_message(turn)],
            metadata,
        };

        if let Some(r) = recorder.as_mut() {
            r.record(RecordingEvent::ProviderCallStarted {
                timestamp: Utc::now(),
                provider_id: descriptor.provider_id.clone(),
            });
        }

        let result = run_sync(&pipeline, input, &stage_ctx, execution.pipeline_timeout_ms).await?;

        conversation_state = result.metadata.get(keys::CONVERSATION_STATE).cloned();

        if let Some(cost) = result.response.cost {
            any_cost = true;
            total_cost.input_tokens += cost.input_tokens;
            total_cost.output_tokens += cost.output_tokens;
            total_cost.total_cost += cost.total_cost;
            if let Some(r) = recorder.as_mut() {
                r.record(RecordingEvent::ProviderCallCompleted {
                    timestamp: Utc::now(),
                    provider_id: descriptor.provider_id.clone(),
                    input_tokens: cost.input_tokens,
                    output_tokens: cost.output_tokens,
                    cost: cost.total_cost,
                });
            }
        }

        if let Some(r) = recorder.as_mut() {
            r.record(RecordingEvent::MessageCreated {
                timestamp: Utc::now(),
                message: result.response.message.clone(),
            });
        }

        let turn_violations: Vec<ValidationError> = result
            .metadata
            .get(keys::VIOLATIONS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        for v in &turn_violations {
            if let Some(r) = recorder.as_mut() {
                r.record(RecordingEvent::ValidationEvaluated {
                    timestamp: Utc::now(),
                    assertion_type: v.assertion_type.clone(),
                    passed: false,
                    detail: Some(v.detail.clone()),
                });
            }
        }
        violations.extend(turn_violations);

        let tool_violations: Vec<String> = result
            .metadata
            .get(keys::TOOL_VIOLATIONS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        violations.extend(tool_violations.into_iter().map(|detail| ValidationError {
            assertion_type: "tool_policy".into(),
            scope: AssertionScope::Turn,
            detail,
            expected: None,
            actual: None,
        }));
    }

    if !scenario.conversation_assertions.is_empty() {
        let eval_ctx = EvalContext {
            providers: &services.providers,
            default_judge_provider: services.default_judge_provider.as_deref(),
            validators: &services.validators,
            http_client: &services.http_client,
        };
        let final_state = conversation_state_or_empty(&conversation_state, &descriptor.run_id, start_time)?;
        let input = EvalInput {
            scope: AssertionScope::Conversation,
            turn_response: None,
            turn_tool_calls: &[],
            history: &final_state.messages,
        };
        for assertion in &scenario.conversation_assertions {
            let outcome = evaluate(assertion, &input, &eval_ctx).await?;
            let passed = outcome.is_none();
            TraceEvent::ValidationEvaluated {
                run_id: descriptor.run_id.clone(),
                assertion_type: assertion.type_name().to_string(),
                passed,
            }
            .emit();
            if let Some(r) = recorder.as_mut() {
                r.record(RecordingEvent::ValidationEvaluated {
                    timestamp: Utc::now(),
                    assertion_type: assertion.type_name().to_string(),
                    passed,
                    detail: outcome.as_ref().map(|v| v.detail.clone()),
                });
            }
            if let Some(violation) = outcome {
                violations.push(violation);
            }
        }
    }

    let end_time = Utc::now();

    let recording_ref = if let Some(r) = recorder {
        let dir = PathBuf::from(&execution.recording.directory);
        let path = dir.join(format!("{}.jsonl", descriptor.run_id));
        let event_count = r.event_count();
        r.finish(&path, end_time).await?;
        TraceEvent::RecordingWritten {
            run_id: descriptor.run_id.clone(),
            path: path.display().to_string(),
            event_count,
        }
        .emit();
        Some(RecordingRef {
            source: execution.recording.directory.clone(),
            id: format!("{}.jsonl", descriptor.run_id),
            type_hint: Some(conductor_domain::recording::RecordingFormat::Session),
            sub_index: None,
        })
    } else {
        None
    };

    let cost = any_cost.then_some(total_cost);

    Ok(RunResultBuilder::from(descriptor).finish(start_time, end_time, cost, String::new(), violations, recording_ref))
}

/// Appends a scripted non-user turn's message directly into the carried
/// conversation state, the same state the pipeline reads from and writes
/// back to on user turns (§4.2 step 3: every turn is played in order, not
/// just the ones that go to the provider).
fn append_scripted_turn(conversation_state: &mut Option<serde_json::Value>, conversation_id: &str, turn: &Turn) -> Result<()> {
    let mut state = conversation_state_or_empty(conversation_state, conversation_id, Utc::now())?;
    state.append(turn_message(turn));
    *conversation_state = Some(serde_json::to_value(&state)?);
    Ok(())
}

fn conversation_state_or_empty(
    conversation_state: &Option<serde_json::Value>,
    conversation_id: &str,
    created_at: chrono::DateTime<Utc>,
) -> Result<ConversationState> {
    Ok(match conversation_state {
        Some(value) => serde_json::from_value(value.clone())?,
        None => ConversationState::new(conversation_id, created_at),
    })
}

fn turn_message(turn: &Turn) -> Message {
    let text = turn.content.as_text().unwrap_or_default().to_string();
    match turn.role {
        Role::System => Message::system(text),
        Role::User => Message::user(text),
        Role::Assistant => Message::assistant(text),
        Role::Tool => Message::tool_result("scripted", text),
    }
}

fn fixtures_as_variables(scenario: &Scenario) -> HashMap<String, String> {
    scenario
        .fixtures
        .iter()
        .map(|(k, v)| {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect()
}

fn errored_result(descriptor: &RunDescriptor, error: String) -> RunResult {
    let now = Utc::now();
    RunResultBuilder::from(descriptor).finish(now, now, None, error, Vec::new(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_assertions::validator::ValidatorRegistry;
    use conductor_domain::assertion::Assertion;
    use conductor_domain::capability::LlmCapabilities;
    use conductor_domain::config::{ContextBudgetConfig, PromptConfig, PromptRegistryConfig};
    use conductor_domain::run::RunDescriptor;
    use conductor_domain::scenario::{ToolPolicy, TurnContent};
    use conductor_providers::mock::MockProvider;
    use conductor_providers::registry::ProviderRegistry;
    use conductor_repository::json::JsonRepository;
    use conductor_tools::ToolRegistry;
    use std::collections::HashMap as Map;

    fn services() -> Arc<PipelineServices> {
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(MockProvider::echo("p1", LlmCapabilities::default())));

        let mut prompts = PromptRegistryConfig::default();
        prompts.prompts.insert(
            "default".into(),
            PromptConfig {
                system_template: "be helpful".into(),
                allowed_tools: Vec::new(),
                metadata: Map::new(),
            },
        );

        Arc::new(PipelineServices::new(
            Arc::new(providers),
            Arc::new(ToolRegistry::new()),
            Arc::new(ValidatorRegistry::new()),
            prompts,
            ContextBudgetConfig::default(),
        ))
    }

    fn scenario() -> Scenario {
        Scenario {
            id: "greet".into(),
            task_type: "default".into(),
            required_capabilities: Vec::new(),
            tool_policy: ToolPolicy::default(),
            fixtures: Map::new(),
            turns: vec![Turn {
                role: Role::User,
                content: TurnContent::Text("hello there".into()),
                persona: None,
                assertions: vec![Assertion::ContentIncludes {
                    patterns: vec!["hello".into()],
                }],
            }],
            conversation_assertions: vec![Assertion::ContentNotEmpty],
        }
    }

    fn repository(dir: &tempfile::TempDir) -> Arc<dyn Repository> {
        Arc::new(JsonRepository::new(dir.path().join("results.json")))
    }

    #[tokio::test]
    async fn executes_a_passing_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(services(), vec![scenario()], repository(&dir), ExecutionConfig::default());
        let plan = RunPlan {
            entries: vec![RunDescriptor {
                run_id: "r1".into(),
                prompt_pack: "default".into(),
                scenario_id: "greet".into(),
                provider_id: "p1".into(),
                region: None,
            }],
        };

        let results = executor.run_plan(&plan).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed(), "expected a passing run, got {:?}", results[0]);
    }

    #[tokio::test]
    async fn unknown_scenario_becomes_an_errored_result_without_aborting_the_plan() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(services(), vec![scenario()], repository(&dir), ExecutionConfig::default());
        let plan = RunPlan {
            entries: vec![
                RunDescriptor {
                    run_id: "r1".into(),
                    prompt_pack: "default".into(),
                    scenario_id: "does-not-exist".into(),
                    provider_id: "p1".into(),
                    region: None,
                },
                RunDescriptor {
                    run_id: "r2".into(),
                    prompt_pack: "default".into(),
                    scenario_id: "greet".into(),
                    provider_id: "p1".into(),
                    region: None,
                },
            ],
        };

        let results = executor.run_plan(&plan).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].passed());
        assert!(results[0].error.contains("does-not-exist"));
        assert!(results[1].passed());
    }

    #[tokio::test]
    async fn failing_turn_assertion_surfaces_as_a_violation_not_an_error() {
        let mut s = scenario();
        s.turns[0].assertions = vec![Assertion::ContentIncludes {
            patterns: vec!["goodbye".into()],
        }];
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(services(), vec![s], repository(&dir), ExecutionConfig::default());
        let plan = RunPlan {
            entries: vec![RunDescriptor {
                run_id: "r1".into(),
                prompt_pack: "default".into(),
                scenario_id: "greet".into(),
                provider_id: "p1".into(),
                region: None,
            }],
        };

        let results = executor.run_plan(&plan).await.unwrap();
        assert!(results[0].error.is_empty());
        assert!(!results[0].violations.is_empty());
        assert!(!results[0].passed());
    }

    #[test]
    fn append_scripted_turn_threads_into_conversation_state() {
        let mut state: Option<serde_json::Value> = None;
        let system_turn = Turn {
            role: Role::System,
            content: TurnContent::Text("pinned context".into()),
            persona: None,
            assertions: Vec::new(),
        };
        append_scripted_turn(&mut state, "c1", &system_turn).unwrap();
        let parsed: ConversationState = serde_json::from_value(state.clone().unwrap()).unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages[0].text_content(), Some("pinned context"));

        let assistant_turn = Turn {
            role: Role::Assistant,
            content: TurnContent::Text("scripted reply".into()),
            persona: None,
            assertions: Vec::new(),
        };
        append_scripted_turn(&mut state, "c1", &assistant_turn).unwrap();
        let parsed: ConversationState = serde_json::from_value(state.unwrap()).unwrap();
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[1].text_content(), Some("scripted reply"));
    }

    #[tokio::test]
    async fn scripted_turn_ahead_of_a_user_turn_survives_into_the_final_conversation_state() {
        let mut s = scenario();
        s.turns = vec![
            Turn {
                role: Role::System,
                content: TurnContent::Text("pinned context".into()),
                persona: None,
                assertions: Vec::new(),
            },
            Turn {
                role: Role::User,
                content: TurnContent::Text("hello there".into()),
                persona: None,
                assertions: vec![Assertion::ContentIncludes {
                    patterns: vec!["hello".into()],
                }],
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(services(), vec![s], repository(&dir), ExecutionConfig::default());
        let plan = RunPlan {
            entries: vec![RunDescriptor {
                run_id: "r1".into(),
                prompt_pack: "default".into(),
                scenario_id: "greet".into(),
                provider_id: "p1".into(),
                region: None,
            }],
        };

        let results = executor.run_plan(&plan).await.unwrap();
        assert!(results[0].error.is_empty(), "unexpected error: {}", results[0].error);
        assert!(results[0].passed(), "expected a passing run, got {:?}", results[0]);
    }

    #[tokio::test]
    async fn recording_is_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let recordings_dir = dir.path().join("recordings");
        let execution = ExecutionConfig {
            recording: conductor_domain::config::RecordingConfig {
                enabled: true,
                directory: recordings_dir.to_string_lossy().to_string(),
            },
            ..ExecutionConfig::default()
        };
        let executor = Executor::new(services(), vec![scenario()], repository(&dir), execution);
        let plan = RunPlan {
            entries: vec![RunDescriptor {
                run_id: "r1".into(),
                prompt_pack: "default".into(),
                scenario_id: "greet".into(),
                provider_id: "p1".into(),
                region: None,
            }],
        };

        let results = executor.run_plan(&plan).await.unwrap();
        let recording_ref = results[0].recording_ref.as_ref().expect("recording ref");
        assert!(recordings_dir.join(&recording_ref.id).exists());
    }
}
