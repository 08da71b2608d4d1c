//! Bolota: veterinary assistant chat webhook.
//!
//! A user message goes to an LLM chat session that can call two tools (drug
//! price/stock lookup in the local medicine store, PubMed literature search);
//! tool results are fed back once and the final reply is returned over HTTP.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod subsystems;

pub use bootstrap::logger;
pub use self::core::{config, error};
