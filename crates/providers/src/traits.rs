use conductor_domain::capability::LlmCapabilities;
use conductor_domain::error::Result;
use conductor_domain::message::{Message, ToolCall};
use conductor_domain::scenario::ToolChoice;
use conductor_domain::stream::{BoxStream, StreamEvent, Usage};
use conductor_domain::tool::ToolDefinition;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request. The provider stage (§4.1)
/// builds one of these from the assembled system prompt, the turn
/// history, and the scenario's tool policy.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The conversation messages to send.
    pub messages: Vec<Message>,
    /// Tool definitions the model may invoke.
    pub tools: Vec<ToolDefinition>,
    /// How the provider stage wants tool calling driven for this turn.
    pub tool_choice: ToolChoice,
    /// Sampling temperature (0.0 – 2.0). `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_tokens: Option<u32>,
    /// When `true`, request the model to respond with valid JSON only.
    pub json_mode: bool,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Textual content of the response.
    pub content: String,
    /// Tool calls emitted by the model.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information, when the provider reports usage.
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// The reason the model stopped generating (e.g. "stop", "tool_calls").
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// A plain-text response with no tool calls and no usage info, for
    /// adapters (mock, replay) that don't meter tokens.
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: None,
            model: model.into(),
            finish_reason: Some("stop".into()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The abstract capability the engine consumes. Concrete HTTP adapters to
/// OpenAI/Gemini/Claude/etc. are out of scope (§1) and are wired in at
/// startup as external implementations of this trait, keyed by provider
/// id in the [`crate::registry::ProviderRegistry`]; the registry itself
/// only knows how to construct the `mock` and `replay` kinds natively.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Send a chat request and wait for the full response (synchronous
    /// pipeline mode, or a non-streaming provider stage).
    async fn predict(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// Send a chat request and return a stream of events (streaming
    /// pipeline mode). Implementations that cannot stream natively may
    /// synthesize a single-chunk stream from [`Self::predict`].
    async fn predict_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    /// The advertised capabilities of this provider, consulted by the
    /// planner's capability gating (§8 invariant 3).
    fn capabilities(&self) -> &LlmCapabilities;

    /// A unique identifier for this provider instance, matching its
    /// `ProviderConfig::id`.
    fn provider_id(&self) -> &str;
}
