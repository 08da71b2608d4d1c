//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete backends; each backend translates
//! the provider-neutral conversation types below into its own wire format.
//! Provider instances are shared immutable capabilities; clone them freely.
//!
//! A conversation is a list of [`Turn`]s. The model answers with text and/or
//! [`ToolCall`]s; the caller answers tool calls with [`FunctionResponse`]s in
//! a `Role::Function` turn. [`session::ChatSession`] keeps that history for
//! one request.

pub mod providers;
pub mod session;

use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("missing API key for provider '{0}' (set GEMINI_API_KEY or LLM_API_KEY)")]
    MissingApiKey(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

// ── Conversation types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    /// Carries function responses back to the model.
    Function,
}

/// A function the model asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned call id (OpenAI `tool_call_id`); Gemini leaves it empty.
    pub id: Option<String>,
    pub name: String,
    /// Argument bag, normally a JSON object.
    pub args: Value,
    /// Opaque token the provider wants echoed back verbatim with this call
    /// (Gemini thought signatures).
    pub signature: Option<String>,
}

/// Result of one [`ToolCall`], tied to it by name (and id when present).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(ToolCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, parts: vec![Part::Text(text.into())] }
    }

    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::Function,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Concatenated text parts, in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }
}

/// Declaration of a callable tool, advertised to the model with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments, including `required`.
    pub parameters: Value,
}

/// Everything a provider needs for one generation call.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: Option<&'a str>,
    pub tools: &'a [ToolDeclaration],
    pub history: &'a [Turn],
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Token usage reported by the provider for a single call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_input_tokens: u64,
}

/// One model reply: a `Role::Model` turn plus optional usage.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub turn: Turn,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(&self) -> String {
        self.turn.text()
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.turn.tool_calls().cloned().collect()
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch keeps `generate` a plain `async fn` with no trait objects.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Gemini(providers::gemini::GeminiProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send the conversation so far and return the model's next turn.
    pub async fn generate(&self, request: &ChatRequest<'_>) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.generate(request).await,
            LlmProvider::Gemini(p) => p.generate(request).await,
            LlmProvider::OpenAiCompatible(p) => p.generate(request).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Gemini(_) => "gemini",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}
