//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `BOLOTA_LOG_LEVEL` / `BOLOTA_BIND` env overrides.
//!
//! Relative store and prompt paths resolve against the directory of the
//! loaded config file. With no config file they resolve against the
//! directory holding the executable.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::RawConfig;
use super::types::*;

/// Deep-merge two TOML values.
/// Tables merge recursively; any other overlay value replaces the base value.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow its `[meta] base` chain, return the merged value.
/// `visited` holds canonical paths already seen so cycles fail fast.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let base_str = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
        .map(str::to_string);

    match base_str {
        Some(base_str) => {
            let base_path = if Path::new(&base_str).is_absolute() {
                PathBuf::from(base_str)
            } else {
                path.parent().unwrap_or(Path::new(".")).join(base_str)
            };
            let base_val = load_raw_merged(&base_path, visited)?;
            Ok(merge_toml(base_val, overlay_val))
        }
        None => Ok(overlay_val),
    }
}

/// Load config from `config_path`, or `config/default.toml` (looked up in the
/// working directory, then next to the executable), or built-in defaults;
/// then apply env overrides.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("BOLOTA_LOG_LEVEL").ok();
    let bind_override = env::var("BOLOTA_BIND").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            log_level_override.as_deref(),
            bind_override.as_deref(),
        );
    }

    let exe_dir = executable_dir();
    let candidates = [
        PathBuf::from("config/default.toml"),
        exe_dir.join("config/default.toml"),
    ];
    if let Some(default_path) = candidates.iter().find(|p| p.exists()) {
        return load_from(
            default_path,
            log_level_override.as_deref(),
            bind_override.as_deref(),
        );
    }

    resolve(
        RawConfig::default(),
        &exe_dir,
        log_level_override.as_deref(),
        bind_override.as_deref(),
        &process_env,
    )
}

/// Load from an explicit path. Tests pass overrides directly instead of
/// mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    bind_override: Option<&str>,
) -> Result<Config, AppError> {
    load_from_with_env(path, log_level_override, bind_override, &process_env)
}

pub(super) fn load_from_with_env(
    path: &Path,
    log_level_override: Option<&str>,
    bind_override: Option<&str>,
    env_var: &dyn Fn(&str) -> Option<String>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("invalid config in {}: {e}", path.display()))
    })?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    resolve(parsed, base_dir, log_level_override, bind_override, env_var)
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn executable_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Env vars holding the API key for `provider`, in lookup order. Keys are
/// never shared across providers.
fn api_key_vars(provider: &str) -> &'static [&'static str] {
    match provider {
        "gemini" => &["GEMINI_API_KEY"],
        "openai" | "openai-compatible" => &["LLM_API_KEY", "OPENAI_API_KEY"],
        _ => &[],
    }
}

pub(super) fn api_key_for(provider: &str, env_var: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    api_key_vars(provider)
        .iter()
        .filter_map(|name| env_var(name))
        .find(|k| !k.trim().is_empty())
}

/// `~` expansion, then relative paths are anchored at `base_dir`.
fn resolve_path(raw: &str, base_dir: &Path) -> PathBuf {
    let path = expand_home(raw);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

fn resolve(
    parsed: RawConfig,
    base_dir: &Path,
    log_level_override: Option<&str>,
    bind_override: Option<&str>,
    env_var: &dyn Fn(&str) -> Option<String>,
) -> Result<Config, AppError> {
    let seed_delimiter = match parsed.store.seed_delimiter.as_bytes() {
        [b] if b.is_ascii() => *b,
        _ => {
            return Err(AppError::Config(format!(
                "store.seed_delimiter must be a single ASCII character, got {:?}",
                parsed.store.seed_delimiter
            )));
        }
    };

    if parsed.pubmed.max_results == 0 {
        return Err(AppError::Config("pubmed.max_results must be at least 1".into()));
    }

    let log_level = log_level_override.unwrap_or(&parsed.bot.log_level).to_string();
    let bind = bind_override.unwrap_or(&parsed.server.bind).to_string();
    let llm_api_key = api_key_for(&parsed.llm.provider, env_var);

    Ok(Config {
        bot_name: parsed.bot.name,
        log_level,
        log_file: parsed.bot.log_file.as_deref().map(expand_home),
        language: parsed.bot.language,
        server: ServerConfig { bind },
        store: StoreConfig {
            db_path: resolve_path(&parsed.store.db_path, base_dir),
            seed_path: resolve_path(&parsed.store.seed_path, base_dir),
            seed_delimiter,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            gemini: GeminiConfig {
                api_base_url: parsed.llm.gemini.api_base_url,
                model: parsed.llm.gemini.model,
                temperature: parsed.llm.gemini.temperature,
                timeout_seconds: parsed.llm.gemini.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key,
        pubmed: PubMedConfig {
            base_url: parsed.pubmed.base_url,
            article_base_url: parsed.pubmed.article_base_url,
            domain_filter: parsed.pubmed.domain_filter,
            max_results: parsed.pubmed.max_results,
            timeout_seconds: parsed.pubmed.timeout_seconds,
        },
        prompts_dir: resolve_path(&parsed.prompts.dir, base_dir),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
