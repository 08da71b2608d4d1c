//! Per-request chat session.
//!
//! Owns the system instruction, the tool declarations and the growing turn
//! history for one conversation. Every `send_*` call appends the outgoing
//! turn, asks the provider for the next turn and appends the reply, so the
//! provider always sees the complete exchange.

use tracing::debug;

use super::{
    ChatRequest, FunctionResponse, LlmProvider, LlmResponse, Part, ProviderError, Role, ToolCall,
    ToolDeclaration, Turn,
};

pub struct ChatSession<'p> {
    provider: &'p LlmProvider,
    system: String,
    tools: Vec<ToolDeclaration>,
    history: Vec<Turn>,
}

impl<'p> ChatSession<'p> {
    pub fn new(provider: &'p LlmProvider, system: impl Into<String>, tools: Vec<ToolDeclaration>) -> Self {
        Self {
            provider,
            system: system.into(),
            tools,
            history: Vec::new(),
        }
    }

    /// Send a user text message.
    pub async fn send_message(&mut self, text: &str) -> Result<LlmResponse, ProviderError> {
        self.send(Turn::user(text)).await
    }

    /// Send a batch of function responses as a single message.
    ///
    /// Calls in the preceding model turn that have no response in the batch
    /// are pruned first; providers reject a call left unanswered.
    pub async fn send_function_responses(
        &mut self,
        responses: Vec<FunctionResponse>,
    ) -> Result<LlmResponse, ProviderError> {
        if let Some(model_turn) = self.history.last_mut().filter(|t| t.role == Role::Model) {
            let before = model_turn.parts.len();
            model_turn.parts.retain(|part| match part {
                Part::FunctionCall(call) => responses.iter().any(|r| answers(r, call)),
                _ => true,
            });
            if model_turn.parts.len() != before {
                debug!(dropped = before - model_turn.parts.len(), "pruned unanswered tool calls");
            }
        }
        self.send(Turn::function_responses(responses)).await
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    async fn send(&mut self, turn: Turn) -> Result<LlmResponse, ProviderError> {
        self.history.push(turn);

        let system = (!self.system.trim().is_empty()).then_some(self.system.as_str());
        let request = ChatRequest {
            system,
            tools: &self.tools,
            history: &self.history,
        };

        let response = match self.provider.generate(&request).await {
            Ok(r) => r,
            Err(e) => {
                // Leave history as it was before this send.
                self.history.pop();
                return Err(e);
            }
        };

        debug!(
            provider = self.provider.name(),
            turns = self.history.len() + 1,
            tool_calls = response.turn.tool_calls().count(),
            "model turn received"
        );
        self.history.push(response.turn.clone());
        Ok(response)
    }
}

/// Pairs by id when the provider issued one, by tool name otherwise.
fn answers(response: &FunctionResponse, call: &ToolCall) -> bool {
    match (&response.id, &call.id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => response.name == call.name,
        _ => false,
    }
}
