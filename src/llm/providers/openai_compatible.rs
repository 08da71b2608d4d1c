//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Maps the neutral turn history onto `messages`, advertises tools in the
//! `tools` array and reads `tool_calls` back. Function responses become
//! `role: "tool"` messages keyed by `tool_call_id`. All OpenAI wire types are
//! private to this module.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::llm::{ChatRequest, LlmResponse, LlmUsage, Part, ProviderError, Role, ToolCall, Turn};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`
/// (OpenAI, Ollama, LM Studio, vLLM…).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// `api_key` is `None` for keyless local models; when present it is sent
    /// as `Authorization: Bearer <key>`.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, request: &ChatRequest<'_>) -> Result<LlmResponse, ProviderError> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(self.temperature)
        };

        let messages = build_messages(request.system, request.history);

        let tools = request
            .tools
            .iter()
            .map(|t| ToolSpec {
                kind: "function",
                function: FunctionSpec {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect();

        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools,
            temperature,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            messages = payload.messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Decode(format!("failed to parse response body: {e}"))
        })?;

        into_response(parsed)
    }
}

fn into_response(parsed: ChatCompletionResponse) -> Result<LlmResponse, ProviderError> {
    debug!(choices = parsed.choices.len(), "received LLM response");

    let usage = parsed.usage.map(|u| LlmUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        cached_input_tokens: u.prompt_tokens_details.map(|d| d.cached_tokens).unwrap_or(0),
    });

    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ProviderError::Decode("no choices in response".into()))?;

    let mut parts = Vec::new();
    if let Some(text) = message.content.filter(|s| !s.trim().is_empty()) {
        parts.push(Part::Text(text));
    }
    for call in message.tool_calls.unwrap_or_default() {
        // `arguments` is a JSON-encoded string; keep it raw when it isn't valid JSON.
        let args = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        parts.push(Part::FunctionCall(ToolCall {
            id: Some(call.id),
            name: call.function.name,
            args,
            signature: None,
        }));
    }

    Ok(LlmResponse {
        turn: Turn { role: Role::Model, parts },
        usage,
    })
}

fn build_messages(system: Option<&str>, history: &[Turn]) -> Vec<Message> {
    let mut messages = Vec::new();
    if let Some(sys) = system {
        messages.push(Message::text("system", sys));
    }
    let mut turns = history.iter().peekable();
    while let Some(turn) = turns.next() {
        let replies = turns.peek().copied().filter(|t| t.role == Role::Function);
        push_turn(&mut messages, turn, replies);
    }
    messages
}

/// Tool calls and their replies are paired by this id.
fn wire_id(id: &Option<String>, name: &str) -> String {
    id.clone().unwrap_or_else(|| name.to_string())
}

/// `replies` is the function turn answering a model turn, if any. Only calls
/// with a reply there are announced; every announced `tool_call_id` must be
/// answered or the endpoint rejects the request.
fn push_turn(messages: &mut Vec<Message>, turn: &Turn, replies: Option<&Turn>) {
    match turn.role {
        Role::User => messages.push(Message::text("user", &turn.text())),
        Role::Model => {
            let answered: Option<Vec<String>> = replies.map(|r| {
                r.parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::FunctionResponse(fr) => Some(wire_id(&fr.id, &fr.name)),
                        _ => None,
                    })
                    .collect()
            });
            let text = turn.text();
            let tool_calls: Vec<WireToolCall> = turn
                .tool_calls()
                .map(|c| (wire_id(&c.id, &c.name), c))
                .filter(|(id, _)| answered.as_ref().is_none_or(|ids| ids.contains(id)))
                .map(|(id, c)| WireToolCall {
                    id,
                    kind: "function".to_string(),
                    function: WireFunction {
                        name: c.name.clone(),
                        arguments: c.args.to_string(),
                    },
                })
                .collect();
            if text.is_empty() && tool_calls.is_empty() {
                return;
            }
            messages.push(Message {
                role: "assistant".to_string(),
                content: (!text.is_empty()).then_some(text),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            });
        }
        Role::Function => {
            for part in &turn.parts {
                if let Part::FunctionResponse(fr) = part {
                    messages.push(Message {
                        role: "tool".to_string(),
                        content: Some(fr.response.to_string()),
                        tool_calls: None,
                        tool_call_id: Some(wire_id(&fr.id, &fr.name)),
                    });
                }
            }
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl Message {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "default_tool_kind")]
    kind: String,
    function: WireFunction,
}

fn default_tool_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    prompt_tokens: u64,
    completion_tokens: u64,
    #[serde(default)]
    prompt_tokens_details: Option<PromptTokensDetails>,
}

#[derive(Debug, Deserialize)]
struct PromptTokensDetails {
    #[serde(default)]
    cached_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionResponse;
    use serde_json::json;

    fn parse(v: Value) -> ChatCompletionResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn tool_calls_are_decoded() {
        let resp = parse(json!({
            "choices": [{ "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "get_drug_stock_price", "arguments": "{\"drugName\":\"Apoquel\"}" }
                }]
            }}],
            "usage": { "prompt_tokens": 10, "completion_tokens": 3 }
        }));

        let reply = into_response(resp).unwrap();
        let calls = reply.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(calls[0].args, json!({ "drugName": "Apoquel" }));
        assert!(reply.text().is_empty());
        assert_eq!(reply.usage.unwrap().input_tokens, 10);
    }

    #[test]
    fn invalid_arguments_kept_as_string() {
        let resp = parse(json!({
            "choices": [{ "message": { "tool_calls": [{
                "id": "c", "function": { "name": "x", "arguments": "not json" }
            }]}}]
        }));
        let calls = into_response(resp).unwrap().tool_calls();
        assert_eq!(calls[0].args, Value::String("not json".into()));
    }

    #[test]
    fn no_choices_is_decode_error() {
        let resp = parse(json!({ "choices": [] }));
        assert!(matches!(into_response(resp), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn function_turn_becomes_tool_messages() {
        let mut messages = Vec::new();
        push_turn(
            &mut messages,
            &Turn::function_responses(vec![
                FunctionResponse { id: Some("call_1".into()), name: "a".into(), response: json!({ "result": 1 }) },
                FunctionResponse { id: None, name: "b".into(), response: json!({ "result": 2 }) },
            ]),
            None,
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "tool");
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("b"));
        assert_eq!(messages[1].content.as_deref(), Some(r#"{"result":2}"#));
    }

    #[test]
    fn model_turn_with_calls_becomes_assistant_message() {
        let mut messages = Vec::new();
        push_turn(
            &mut messages,
            &Turn {
                role: Role::Model,
                parts: vec![Part::FunctionCall(ToolCall {
                    id: Some("call_9".into()),
                    name: "search_scientific_articles".into(),
                    args: json!({ "query": "otite" }),
                    signature: None,
                })],
            },
            None,
        );
        let wire = serde_json::to_value(&messages[0]).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["id"], "call_9");
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], r#"{"query":"otite"}"#);
    }

    fn call(id: &str, name: &str, args: Value) -> Part {
        Part::FunctionCall(ToolCall { id: Some(id.into()), name: name.into(), args, signature: None })
    }

    #[test]
    fn dropped_calls_are_not_announced() {
        let history = vec![
            Turn { role: Role::User, parts: vec![Part::Text("Tem Simparic?".into())] },
            Turn {
                role: Role::Model,
                parts: vec![
                    call("call_a", "order_pizza", json!({})),
                    call("call_b", "get_drug_stock_price", json!({ "drugName": "Simparic" })),
                ],
            },
            Turn::function_responses(vec![FunctionResponse {
                id: Some("call_b".into()),
                name: "get_drug_stock_price".into(),
                response: json!({ "result": { "stock": 12 } }),
            }]),
        ];

        let wire = serde_json::to_value(build_messages(Some("sys"), &history)).unwrap();
        let wire = wire.as_array().unwrap();
        assert_eq!(wire.len(), 4);

        let announced: Vec<&str> = wire[2]["tool_calls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(announced, ["call_b"]);
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "call_b");
    }

    #[test]
    fn unanswered_model_turn_keeps_its_calls() {
        let history = vec![Turn {
            role: Role::Model,
            parts: vec![call("call_a", "order_pizza", json!({}))],
        }];
        let messages = build_messages(None, &history);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tool_calls.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn follow_up_request_pairs_every_call() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Temos 12 unidades." } }]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiCompatibleProvider::new(
            format!("{}/v1/chat/completions", server.uri()),
            "gpt-4o-mini".into(),
            0.2,
            5,
            Some("sk-test".into()),
        )
        .unwrap();

        let history = vec![
            Turn { role: Role::User, parts: vec![Part::Text("Tem Simparic?".into())] },
            Turn {
                role: Role::Model,
                parts: vec![
                    call("call_a", "order_pizza", json!({})),
                    call("call_b", "get_drug_stock_price", json!({ "drugName": "Simparic" })),
                ],
            },
            Turn::function_responses(vec![FunctionResponse {
                id: Some("call_b".into()),
                name: "get_drug_stock_price".into(),
                response: json!({ "result": { "stock": 12 } }),
            }]),
        ];
        let request = ChatRequest { system: None, history: &history, tools: &[] };
        let reply = provider.generate(&request).await.unwrap();
        assert_eq!(reply.text(), "Temos 12 unidades.");

        let sent: Value = server.received_requests().await.unwrap()[0].body_json().unwrap();
        let messages = sent["messages"].as_array().unwrap();
        let announced: Vec<&Value> = messages
            .iter()
            .filter_map(|m| m["tool_calls"].as_array())
            .flatten()
            .map(|c| &c["id"])
            .collect();
        let answered: Vec<&Value> = messages
            .iter()
            .filter(|m| m["role"] == "tool")
            .map(|m| &m["tool_call_id"])
            .collect();
        assert_eq!(announced, answered);
    }
}
