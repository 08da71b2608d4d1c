//! Google Gemini provider (`models/{model}:generateContent`).
//!
//! Translates the provider-neutral [`Turn`] history into Gemini `contents`,
//! advertises tools as `functionDeclarations`, and maps `functionCall` parts
//! in the reply back into [`ToolCall`]s. All Gemini wire types are private to
//! this module. The REST API is stateless; the session history is resent on
//! every call.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::llm::{
    ChatRequest, FunctionResponse, LlmResponse, LlmUsage, Part, ProviderError, Role, ToolCall,
    ToolDeclaration, Turn,
};

/// Adapter for the Gemini REST API. Cheap to clone (`reqwest::Client` is an
/// `Arc` internally).
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    api_key: String,
}

impl GeminiProvider {
    /// `api_base_url` is the API root (e.g. `https://generativelanguage.googleapis.com/v1beta`);
    /// the model path is appended here.
    pub fn new(
        api_base_url: &str,
        model: String,
        temperature: Option<f32>,
        timeout_seconds: u64,
        api_key: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            api_base_url.trim_end_matches('/'),
            model
        );

        Ok(Self { client, endpoint, model, temperature, api_key })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One `generateContent` round-trip for the whole history.
    pub async fn generate(&self, request: &ChatRequest<'_>) -> Result<LlmResponse, ProviderError> {
        let payload = GenerateContentRequest {
            system_instruction: request.system.map(|s| WireContent {
                role: None,
                parts: vec![WirePart { text: Some(s.to_string()), ..WirePart::default() }],
            }),
            contents: request.history.iter().map(WireContent::from_turn).collect(),
            tools: tools_payload(request.tools),
            generation_config: self
                .temperature
                .map(|t| GenerationConfig { temperature: Some(t) }),
        };

        debug!(
            model = %self.model,
            turns = payload.contents.len(),
            tools = request.tools.len(),
            "sending Gemini request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full Gemini request payload");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "Gemini HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let body = response.text().await.map_err(|e| {
            ProviderError::Request(format!("failed to read response body: {e}"))
        })?;
        trace!(response = %body, "full Gemini response payload");

        parse_response(&body)
    }
}

/// Decode a `generateContent` response body into a model turn.
fn parse_response(body: &str) -> Result<LlmResponse, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "failed to deserialize Gemini response");
        ProviderError::Decode(format!("failed to parse response body: {e}"))
    })?;

    let usage = parsed.usage_metadata.map(|u| LlmUsage {
        input_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
        cached_input_tokens: u.cached_content_token_count,
    });

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"))
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(ProviderError::Decode(reason));
    };

    debug!(finish_reason = ?candidate.finish_reason, "received Gemini response");

    let parts = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(WirePart::into_part)
        .collect();

    Ok(LlmResponse {
        turn: Turn { role: Role::Model, parts },
        usage,
    })
}

fn tools_payload(tools: &[ToolDeclaration]) -> Vec<WireTool<'_>> {
    if tools.is_empty() {
        return Vec::new();
    }
    vec![WireTool {
        function_declarations: tools
            .iter()
            .map(|t| WireFunctionDeclaration {
                name: &t.name,
                description: &t.description,
                parameters: &t.parameters,
            })
            .collect(),
    }]
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    function_declarations: Vec<WireFunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct WireFunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl WireContent {
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => "user",
            Role::Model => "model",
            Role::Function => "function",
        };
        Self {
            role: Some(role.to_string()),
            parts: turn.parts.iter().map(WirePart::from_part).collect(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

impl WirePart {
    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text(t) => Self { text: Some(t.clone()), ..Self::default() },
            Part::FunctionCall(call) => Self {
                function_call: Some(WireFunctionCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                thought_signature: call.signature.clone(),
                ..Self::default()
            },
            Part::FunctionResponse(FunctionResponse { id, name, response }) => Self {
                function_response: Some(WireFunctionResponse {
                    id: id.clone(),
                    name: name.clone(),
                    response: response.clone(),
                }),
                ..Self::default()
            },
        }
    }

    /// Thought summaries are dropped; they are not part of the answer.
    fn into_part(self) -> Option<Part> {
        if let Some(fc) = self.function_call {
            return Some(Part::FunctionCall(ToolCall {
                id: fc.id,
                name: fc.name,
                args: fc.args,
                signature: self.thought_signature,
            }));
        }
        if self.thought == Some(true) {
            return None;
        }
        self.text.map(Part::Text)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    cached_content_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// Google API error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pass a successful response through, or turn the error body into a message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => {
            let code = env.error.status.map(|s| format!(" [{s}]")).unwrap_or_default();
            format!("HTTP {status}{code}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    };

    error!(%status, %message, "Gemini request returned HTTP error");
    Err(ProviderError::Request(message))
}
