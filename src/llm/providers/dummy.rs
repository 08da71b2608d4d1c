//! Dummy LLM provider: echoes the latest user text back prefixed with `[echo]`.
//! Never requests tools. Lets the server run end to end without an API key.

use crate::llm::{ChatRequest, LlmResponse, Part, ProviderError, Role, Turn};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn generate(&self, request: &ChatRequest<'_>) -> Result<LlmResponse, ProviderError> {
        let last_user = request
            .history
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(Turn::text)
            .unwrap_or_default();

        Ok(LlmResponse {
            turn: Turn {
                role: Role::Model,
                parts: vec![Part::Text(format!("[echo] {last_user}"))],
            },
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(history: &[Turn]) -> ChatRequest<'_> {
        ChatRequest { system: None, tools: &[], history }
    }

    #[tokio::test]
    async fn echoes_last_user_turn() {
        let history = vec![Turn::user("primeira"), Turn::user("segunda")];
        let reply = DummyProvider.generate(&request(&history)).await.unwrap();
        assert_eq!(reply.text(), "[echo] segunda");
        assert!(reply.tool_calls().is_empty());
        assert!(reply.usage.is_none());
    }

    #[tokio::test]
    async fn empty_history_echoes_nothing() {
        let reply = DummyProvider.generate(&request(&[])).await.unwrap();
        assert_eq!(reply.text(), "[echo] ");
    }
}
