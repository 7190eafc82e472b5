use std::sync::Arc;

use conductor_domain::config::ContextBudgetConfig;

use crate::stage::Stage;
use crate::stages::{
    AudioTurnStage, ContextBuilderStage, DuplexProviderStage, PromptAssemblyStage, ProviderStage, STTStage,
    StateStoreLoadStage, StateStoreSaveStage, TTSStage, TemplateStage, ValidationStage, VariableProviderStage,
};

/// A run's stage chain, built once per run (§4.1, §5: one pipeline per
/// run, no cross-run mutable sharing).
pub struct Pipeline {
    pub(crate) stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }
}

/// Assembles the default stage order (§4.1 steps 1-8). The context-builder
/// stage is only included when the scenario configures a nonzero token
/// budget — otherwise it would be a pure no-op on every turn.
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The engine's standard text-conversation pipeline.
    pub fn standard(context_budget: &ContextBudgetConfig) -> Self {
        let mut builder = Self::new()
            .push(StateStoreLoadStage)
            .push(VariableProviderStage)
            .push(PromptAssemblyStage)
            .push(TemplateStage);

        if context_budget.token_budget > 0 {
            builder = builder.push(ContextBuilderStage);
        }

        builder.push(ProviderStage).push(ValidationStage).push(StateStoreSaveStage)
    }

    /// The VAD voice pipeline (§4.1 step 6): audio turns are buffered and
    /// transcribed ahead of the same `ProviderStage`/`ValidationStage` the
    /// text pipeline uses, then the reply is synthesized back to audio.
    /// State-store stages bookend it exactly as they do [`Self::standard`].
    pub fn vad_audio() -> Self {
        Self::new()
            .push(StateStoreLoadStage)
            .push(AudioTurnStage::new())
            .push(STTStage)
            .push(ProviderStage)
            .push(ValidationStage)
            .push(TTSStage)
            .push(StateStoreSaveStage)
    }

    /// The duplex voice pipeline (§4.1 step 6): a single stage that owns a
    /// provider's native bidirectional audio session end to end, bypassing
    /// STT/TTS and `ProviderStage` entirely.
    pub fn duplex_audio() -> Self {
        Self::new().push(DuplexProviderStage::new())
    }

    pub fn push(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline { stages: self.stages }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
