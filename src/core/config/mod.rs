//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` from the working directory or next to the
//! executable (or the file passed with `-f`), then applies `BOLOTA_LOG_LEVEL`
//! and `BOLOTA_BIND` env overrides. Relative paths are anchored at the config
//! file's directory. The model API key comes from the environment only, picked
//! by the active provider.
//!
//! # Module layout
//!
//! - **types**: resolved configuration structs consumed by the subsystems.
//! - **raw**: TOML deserialization shapes with serde defaults; kept private.
//! - **load**: `[meta] base` inheritance, merging, resolution, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests: dummy LLM, no API keys, no external calls.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            bot_name: "Bolota".into(),
            log_level: "info".into(),
            log_file: None,
            language: "português do Brasil".into(),
            server: ServerConfig { bind: "127.0.0.1:0".into() },
            store: StoreConfig {
                db_path: work_dir.join("medication.db"),
                seed_path: work_dir.join("dados_produtos.csv"),
                seed_delimiter: b',',
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                gemini: GeminiConfig {
                    api_base_url: "http://localhost:0/v1beta".into(),
                    model: "test-model".into(),
                    temperature: None,
                    timeout_seconds: 1,
                },
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            pubmed: PubMedConfig {
                base_url: "http://localhost:0/entrez/eutils".into(),
                article_base_url: raw::default_pubmed_article_base_url(),
                domain_filter: "veterinary".into(),
                max_results: 3,
                timeout_seconds: 1,
            },
            prompts_dir: work_dir.join("prompts"),
        }
    }
}
