//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that the subsystems consume.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Server ───────────────────────────────────────────────────────────────────

/// HTTP boundary configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the axum listener binds to.
    pub bind: String,
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Medicine store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file (already expanded, no `~`).
    pub db_path: PathBuf,
    /// Delimited seed file read once when the table is empty.
    pub seed_path: PathBuf,
    /// Single-byte field delimiter of the seed file.
    pub seed_delimiter: u8,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Google Gemini `generateContent` provider configuration (`[llm.gemini]`).
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base_url: String,
    pub model: String,
    /// `None` leaves sampling temperature at the model default.
    pub temperature: Option<f32>,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"gemini"`, `"openai"`, `"dummy"`).
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

// ── PubMed ───────────────────────────────────────────────────────────────────

/// NCBI E-utilities client configuration (`[pubmed]`).
#[derive(Debug, Clone)]
pub struct PubMedConfig {
    /// E-utilities root holding `esearch.fcgi` and `esummary.fcgi`.
    pub base_url: String,
    /// Prefix for canonical article links; the PMID and a `/` are appended.
    pub article_base_url: String,
    /// Term conjoined to every query with `AND`.
    pub domain_filter: String,
    /// `retmax` for the search step.
    pub max_results: usize,
    pub timeout_seconds: u64,
}

// ── Top level ────────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Reply language injected into the system prompt.
    pub language: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    /// From `GEMINI_API_KEY` (or `LLM_API_KEY`). Never sourced from TOML.
    pub llm_api_key: Option<String>,
    pub pubmed: PubMedConfig,
    /// Directory holding the system prompt layers.
    pub prompts_dir: PathBuf,
}

impl Config {
    /// Model name of the active provider, for logs and the health endpoint.
    pub fn active_model(&self) -> &str {
        match self.llm.provider.as_str() {
            "gemini" => &self.llm.gemini.model,
            "openai" | "openai-compatible" => &self.llm.openai.model,
            _ => "none",
        }
    }
}
