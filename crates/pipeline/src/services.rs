use std::collections::HashMap;
use std::sync::Arc;

use conductor_assertions::validator::ValidatorRegistry;
use conductor_contextpack::{RelevanceScorer, Summarizer};
use conductor_domain::config::{ContextBudgetConfig, ModelPricing, PromptRegistryConfig};
use conductor_providers::audio::{SttService, TtsService, TurnDetector};
use conductor_providers::registry::{DuplexProviderRegistry, ProviderRegistry};
use conductor_sessions::store::SharedStateStore;
use conductor_tools::ToolRegistry;

use crate::variables::VariableProvider;

/// The read-only collaborators every stage in a run may need. Built once
/// before the executor starts and shared by every pipeline it spins up
/// (§5: registries are immutable during a plan's execution).
pub struct PipelineServices {
    pub providers: Arc<ProviderRegistry>,
    pub tools: Arc<ToolRegistry>,
    pub validators: Arc<ValidatorRegistry>,
    pub prompts: PromptRegistryConfig,
    pub context_budget: ContextBudgetConfig,
    pub variable_providers: Vec<Arc<dyn VariableProvider>>,
    pub state_store: Option<SharedStateStore>,
    pub default_judge_provider: Option<String>,
    pub http_client: reqwest::Client,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub relevance: Option<Arc<dyn RelevanceScorer>>,
    pub pricing: HashMap<String, ModelPricing>,
    /// Providers with a native duplex-audio session, consulted by
    /// `DuplexProviderStage` (§4.1 step 6). Empty unless a caller wires
    /// one in — no provider in this engine's own registry implements it.
    pub duplex_providers: Arc<DuplexProviderRegistry>,
    /// Speech-to-text, used by `STTStage` in the VAD chain.
    pub stt: Option<Arc<dyn SttService>>,
    /// Text-to-speech, used by `TTSStage` in the VAD chain.
    pub tts: Option<Arc<dyn TtsService>>,
    /// Voice-activity/turn-boundary detector shared by `AudioTurnStage`
    /// and `TTSStage`'s barge-in handling.
    pub turn_detector: Option<Arc<dyn TurnDetector>>,
}

impl PipelineServices {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        tools: Arc<ToolRegistry>,
        validators: Arc<ValidatorRegistry>,
        prompts: PromptRegistryConfig,
        context_budget: ContextBudgetConfig,
    ) -> Self {
        Self {
            providers,
            tools,
            validators,
            prompts,
            context_budget,
            variable_providers: Vec::new(),
            state_store: None,
            default_judge_provider: None,
            http_client: reqwest::Client::new(),
            summarizer: None,
            relevance: None,
            pricing: HashMap::new(),
            duplex_providers: Arc::new(DuplexProviderRegistry::new()),
            stt: None,
            tts: None,
            turn_detector: None,
        }
    }

    pub fn with_variable_providers(mut self, providers: Vec<Arc<dyn VariableProvider>>) -> Self {
        self.variable_providers = providers;
        self
    }

    pub fn with_state_store(mut self, store: SharedStateStore) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn with_default_judge_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.default_judge_provider = Some(provider_id.into());
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_relevance(mut self, relevance: Arc<dyn RelevanceScorer>) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_pricing(mut self, pricing: HashMap<String, ModelPricing>) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_duplex_providers(mut self, registry: Arc<DuplexProviderRegistry>) -> Self {
        self.duplex_providers = registry;
        self
    }

    pub fn with_stt(mut self, stt: Arc<dyn SttService>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_tts(mut self, tts: Arc<dyn TtsService>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn with_turn_detector(mut self, turn_detector: Arc<dyn TurnDetector>) -> Self {
        self.turn_detector = Some(turn_detector);
        self
    }
}
