use conductor_domain::conversation::{ConversationState, ExecutionContext, ExecutionResult, Response, StreamElement};
use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;
use conductor_domain::run::CostInfo;

use crate::builder::Pipeline;
use crate::stage::{attribute, keys, StageContext};

/// Runs one turn through a pipeline's stages in declared order,
/// synchronous-mode (§4.1): each stage runs to completion before the
/// next begins. `timeout_ms == 0` disables the per-pipeline deadline
/// (needed for long-lived duplex sessions elsewhere in the engine; text
/// turns normally set a real budget).
pub async fn run_sync(
    pipeline: &Pipeline,
    input: ExecutionContext,
    ctx: &StageContext,
    timeout_ms: u64,
) -> Result<ExecutionResult> {
    let body = run_stages(pipeline, input, ctx);

    if timeout_ms == 0 {
        return body.await;
    }

    match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), body).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "pipeline run {} exceeded {}ms",
            ctx.run.run_id, timeout_ms
        ))),
    }
}

async fn run_stages(pipeline: &Pipeline, input: ExecutionContext, ctx: &StageContext) -> Result<ExecutionResult> {
    let mut element = StreamElement::new();
    element.metadata = input.metadata;

    let stages = pipeline.stages();
    let Some((first, rest)) = stages.split_first() else {
        return Err(Error::Config("pipeline has no stages configured".into()));
    };

    element = run_one(first.as_ref(), element, ctx).await?;
    element = append_turn_input(element, input.messages, ctx)?;

    for stage in rest {
        element = run_one(stage.as_ref(), element, ctx).await?;
    }

    let state: ConversationState = element
        .metadata
        .get(keys::CONVERSATION_STATE)
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_else(|| ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now()));

    let message = element
        .message
        .clone()
        .or_else(|| state.messages.last().cloned())
        .unwrap_or_else(|| Message::assistant(""));

    let cost: Option<CostInfo> = element
        .metadata
        .get(keys::COST)
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    Ok(ExecutionResult {
        response: Response { message, cost },
        messages: state.messages,
        metadata: element.metadata,
    })
}

async fn run_one(
    stage: &dyn crate::stage::Stage,
    element: StreamElement,
    ctx: &StageContext,
) -> Result<StreamElement> {
    let name = stage.name().to_string();
    let mut outputs = stage
        .process(element, ctx)
        .await
        .map_err(|e| attribute(&name, e))?;
    outputs.pop().ok_or_else(|| {
        Error::Other(format!("stage \"{name}\" produced no output element"))
    })
}

/// Appends the turn's new input messages to the conversation state the
/// state-store-load stage just populated, so every downstream stage sees
/// them (§4.2 step 3: the executor feeds the new turn into the pipeline).
fn append_turn_input(mut element: StreamElement, new_messages: Vec<Message>, ctx: &StageContext) -> Result<StreamElement> {
    if new_messages.is_empty() {
        return Ok(element);
    }
    let mut state: ConversationState = element
        .metadata
        .get(keys::CONVERSATION_STATE)
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_else(|| ConversationState::new(ctx.run.conversation_id.clone(), chrono::Utc::now()));

    for message in new_messages {
        state.append(message);
    }
    element.metadata.insert(
        keys::CONVERSATION_STATE.into(),
        serde_json::to_value(&state).unwrap_or(serde_json::Value::Null),
    );
    Ok(element)
}
