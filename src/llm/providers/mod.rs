//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod gemini;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct the configured `LlmProvider`.
///
/// `api_key` comes from the environment (never TOML). Gemini requires one;
/// OpenAI-compatible endpoints may be keyless local servers.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "gemini" => {
            let g = &config.gemini;
            let key = api_key.ok_or_else(|| ProviderError::MissingApiKey("gemini".into()))?;
            let p = gemini::GeminiProvider::new(
                &g.api_base_url,
                g.model.clone(),
                g.temperature,
                g.timeout_seconds,
                key,
            )?;
            Ok(LlmProvider::Gemini(p))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn llm_config(provider: &str) -> LlmConfig {
        let dir = std::env::temp_dir();
        let mut cfg = Config::test_default(&dir).llm;
        cfg.provider = provider.to_string();
        cfg
    }

    #[test]
    fn builds_dummy_without_key() {
        let p = build(&llm_config("dummy"), None).unwrap();
        assert_eq!(p.name(), "dummy");
    }

    #[test]
    fn gemini_requires_key() {
        let err = build(&llm_config("gemini"), None).unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey(_)));
        assert!(build(&llm_config("gemini"), Some("k".into())).is_ok());
    }

    #[test]
    fn openai_allows_keyless() {
        let p = build(&llm_config("openai-compatible"), None).unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = build(&llm_config("claude-via-carrier-pigeon"), None).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
