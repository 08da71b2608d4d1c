//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults, so an
//! empty file (or no file at all) resolves to a working configuration.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub bot: RawBot,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub store: RawStore,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub pubmed: RawPubMed,
    #[serde(default)]
    pub prompts: RawPrompts,
}

#[derive(Deserialize)]
pub(super) struct RawBot {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for RawBot {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            log_file: None,
            language: default_language(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawStore {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_seed_path")]
    pub seed_path: String,
    #[serde(default = "default_seed_delimiter")]
    pub seed_delimiter: String,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            seed_path: default_seed_path(),
            seed_delimiter: default_seed_delimiter(),
        }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub gemini: RawGemini,
    #[serde(default)]
    pub openai: RawOpenAi,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            gemini: RawGemini::default(),
            openai: RawOpenAi::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawGemini {
    #[serde(default = "default_gemini_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawGemini {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            temperature: None,
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAi {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAi {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

// ── PubMed ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawPubMed {
    #[serde(default = "default_pubmed_base_url")]
    pub base_url: String,
    #[serde(default = "default_pubmed_article_base_url")]
    pub article_base_url: String,
    #[serde(default = "default_pubmed_domain_filter")]
    pub domain_filter: String,
    #[serde(default = "default_pubmed_max_results")]
    pub max_results: usize,
    #[serde(default = "default_pubmed_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawPubMed {
    fn default() -> Self {
        Self {
            base_url: default_pubmed_base_url(),
            article_base_url: default_pubmed_article_base_url(),
            domain_filter: default_pubmed_domain_filter(),
            max_results: default_pubmed_max_results(),
            timeout_seconds: default_pubmed_timeout_seconds(),
        }
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawPrompts {
    #[serde(default = "default_prompts_dir")]
    pub dir: String,
}

impl Default for RawPrompts {
    fn default() -> Self {
        Self { dir: default_prompts_dir() }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_bot_name() -> String { "Bolota".to_string() }
pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_language() -> String { "português do Brasil".to_string() }
pub(super) fn default_bind() -> String { "0.0.0.0:3000".to_string() }
pub(super) fn default_db_path() -> String { "medication.db".to_string() }
pub(super) fn default_seed_path() -> String { "data/dados_produtos.csv".to_string() }
pub(super) fn default_seed_delimiter() -> String { ",".to_string() }
pub(super) fn default_llm_provider() -> String { "gemini".to_string() }
pub(super) fn default_gemini_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
pub(super) fn default_gemini_model() -> String { "gemini-2.5-flash".to_string() }
pub(super) fn default_openai_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
pub(super) fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
pub(super) fn default_openai_temperature() -> f32 { 0.2 }
pub(super) fn default_llm_timeout_seconds() -> u64 { 60 }
pub(super) fn default_pubmed_base_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}
pub(super) fn default_pubmed_article_base_url() -> String {
    "https://pubmed.ncbi.nlm.nih.gov".to_string()
}
pub(super) fn default_pubmed_domain_filter() -> String { "veterinary".to_string() }
pub(super) fn default_pubmed_max_results() -> usize { 3 }
pub(super) fn default_pubmed_timeout_seconds() -> u64 { 30 }
pub(super) fn default_prompts_dir() -> String { "config/prompts".to_string() }
