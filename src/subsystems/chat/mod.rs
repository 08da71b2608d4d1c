//! Chat orchestration: one user message in, one reply out.
//!
//! ```text
//! user message ─▶ model ─┬─ no tool calls ─────────────────────────▶ reply
//!                        └─ tool calls ─▶ registry ─▶ model (once) ─▶ reply
//! ```
//!
//! Exactly one tool round per request: if the follow-up reply asks for more
//! tools, those calls are ignored and its text is returned as-is.

pub mod prompt;

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::session::ChatSession;
use crate::llm::{LlmProvider, ProviderError};
use crate::subsystems::tools::ToolRegistry;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    /// Names of the tools that actually ran, in call order.
    pub tools_called: Vec<String>,
}

pub struct ChatOrchestrator {
    provider: LlmProvider,
    registry: ToolRegistry,
    system_instruction: String,
}

impl ChatOrchestrator {
    pub fn new(provider: LlmProvider, registry: ToolRegistry, system_instruction: String) -> Self {
        Self { provider, registry, system_instruction }
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    pub async fn handle(&self, message: &str) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        info!(chars = message.chars().count(), "handling chat message");
        let mut session = ChatSession::new(
            &self.provider,
            self.system_instruction.as_str(),
            self.registry.declarations(),
        );

        let first = session.send_message(message).await?;
        let calls = first.tool_calls();
        if calls.is_empty() {
            return Ok(ChatReply { reply: first.text(), tools_called: Vec::new() });
        }

        info!(count = calls.len(), "model requested tools");
        let mut responses = Vec::with_capacity(calls.len());
        for call in &calls {
            if let Some(resp) = self.registry.dispatch(call).await {
                responses.push(resp);
            }
        }

        if responses.is_empty() {
            debug!("no known tools among requested calls, skipping follow-up");
            return Ok(ChatReply { reply: first.text(), tools_called: Vec::new() });
        }

        let tools_called = responses.iter().map(|r| r.name.clone()).collect();
        let last = session.send_function_responses(responses).await?;
        if !last.tool_calls().is_empty() {
            debug!("follow-up reply requested more tools, ignoring");
        }

        Ok(ChatReply { reply: last.text(), tools_called })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::PubMedConfig;
    use crate::error::AppError;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::subsystems::pubmed::PubMedClient;
    use crate::subsystems::store::{DrugLookup, MedicineRecord};

    struct NoDrugs;

    impl DrugLookup for NoDrugs {
        fn find_drug(&self, _query: &str) -> Result<Option<MedicineRecord>, AppError> {
            Ok(None)
        }
    }

    fn orchestrator() -> ChatOrchestrator {
        let pubmed = PubMedClient::new(&PubMedConfig {
            base_url: "http://127.0.0.1:9".into(),
            article_base_url: "https://pubmed.ncbi.nlm.nih.gov".into(),
            domain_filter: "veterinary".into(),
            max_results: 3,
            timeout_seconds: 1,
        })
        .unwrap();
        ChatOrchestrator::new(
            LlmProvider::Dummy(DummyProvider),
            ToolRegistry::new(Arc::new(NoDrugs), pubmed),
            "sys".into(),
        )
    }

    #[tokio::test]
    async fn plain_reply_without_tools() {
        let reply = orchestrator().handle("Olá Bolota").await.unwrap();
        assert_eq!(reply.reply, "[echo] Olá Bolota");
        assert!(reply.tools_called.is_empty());
    }

    #[tokio::test]
    async fn blank_message_rejected() {
        let err = orchestrator().handle("  \n ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }
}
