use async_trait::async_trait;
use conductor_domain::conversation::{ConversationState, StreamElement};
use conductor_domain::error::Result;

use crate::stage::{keys, Stage, StageContext};

/// Persists the turn's accumulated conversation state once it has passed
/// validation (§4.1 step 8). A stage failure earlier in the pipeline
/// skips this stage entirely — an aborted turn never overwrites the last
/// durable state (§5).
pub struct StateStoreSaveStage;

#[async_trait]
impl Stage for StateStoreSaveStage {
    fn name(&self) -> &str {
        "state_store_save"
    }

    async fn process(&self, element: StreamElement, ctx: &StageContext) -> Result<Vec<StreamElement>> {
        ctx.check_cancelled()?;
        let Some(store) = &ctx.services.state_store else {
            return Ok(vec![element]);
        };
        let Some(raw_state) = element.metadata.get(keys::CONVERSATION_STATE).cloned() else {
            return Ok(vec![element]);
        };
        let state: ConversationState = serde_json::from_value(raw_state)?;
        store.save(&state).await?;
        Ok(vec![element])
    }
}
