//! The eval workflow (§4.6): evaluate a scenario's conversation-level
//! assertions against a conversation loaded from a recording, instead of
//! a live provider call. Used to grade arena transcripts and human-
//! authored conversations against the same assertion vocabulary a live
//! run uses.

use conductor_assertions::evaluator::{evaluate, EvalContext, EvalInput};
use conductor_domain::assertion::{Assertion, AssertionScope};
use conductor_domain::error::Result;
use conductor_domain::recording::RecordingRef;
use conductor_domain::run::{RunResult, RunResultBuilder};
use conductor_domain::trace::TraceEvent;
use conductor_recording::adapters::AdapterRegistry;

/// Load `reference` through `adapters` and evaluate `conversation_assertions`
/// against it, producing a `RunResult` tagged with the recording it came
/// from rather than a live provider/prompt-pack pair.
pub async fn evaluate_recording(
    reference: &RecordingRef,
    adapters: &AdapterRegistry,
    conversation_assertions: &[Assertion],
    eval_ctx: &EvalContext<'_>,
    run_id: impl Into<String>,
    scenario_id: impl Into<String>,
) -> Result<RunResult> {
    let run_id = run_id.into();
    let start_time = chrono::Utc::now();
    let loaded = adapters.load(reference).await?;

    TraceEvent::RecordingLoaded {
        source: reference.source.clone(),
        id: reference.id.clone(),
        message_count: loaded.messages.len(),
    }
    .emit();

    let input = EvalInput {
        scope: AssertionScope::Conversation,
        turn_response: None,
        turn_tool_calls: &[],
        history: &loaded.messages,
    };

    let mut violations = Vec::new();
    for assertion in conversation_assertions {
        let outcome = evaluate(assertion, &input, eval_ctx).await?;
        let passed = outcome.is_none();
        TraceEvent::ValidationEvaluated {
            run_id: run_id.clone(),
            assertion_type: assertion.type_name().to_string(),
            passed,
        }
        .emit();
        if let Some(violation) = outcome {
            violations.push(violation);
        }
    }

    let end_time = chrono::Utc::now();
    let descriptor = conductor_domain::run::RunDescriptor {
        run_id,
        prompt_pack: String::new(),
        scenario_id: scenario_id.into(),
        provider_id: loaded
            .metadata
            .provider_info
            .provider_id
            .clone()
            .unwrap_or_else(|| "recording".into()),
        region: None,
    };

    let builder: RunResultBuilder = (&descriptor).into();
    Ok(builder.finish(start_time, end_time, None, String::new(), violations, Some(reference.clone())))
}
