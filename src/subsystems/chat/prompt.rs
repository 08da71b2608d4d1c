//! Layered system-instruction builder.
//!
//! The instruction is assembled from plain-text fragments under the prompts
//! directory (`config/prompts/` by default). Each layer is appended in
//! order; missing files are skipped so layers stay optional.
//!
//! ```text
//! 0. id.md    : persona (who Bolota is)
//! 1. rules.md : mandatory answering rules
//! ```
//!
//! `{{key}}` variables are substituted once at [`build()`](PromptBuilder::build)
//! time, after all layers are joined.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

const SEPARATOR: &str = "\n\n";

/// Used when no layer file is found on disk.
const BUILTIN_INSTRUCTION: &str = "\
Você é o {{bot_name}}, um assistente veterinário especialista.

REGRAS OBRIGATÓRIAS:
1. Sempre que informar preço ou estoque de um remédio, você DEVE avisar o usuário do uso somente com prescrição veterinária!
2. Seja cordial, prestativo e SEMPRE responsável.
3. Responda em {{language}}.";

pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append the contents of `filename`; skipped when the file is missing.
    pub fn layer(mut self, filename: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.parts.push(trimmed.to_string());
                }
            }
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found, skipped", path.display());
            }
        }
        self
    }

    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            let placeholder = format!("{{{{{k}}}}}");
            prompt = prompt.replace(&placeholder, v);
        }
        prompt
    }
}

/// The system instruction for every chat session.
pub fn system_instruction(config: &Config) -> String {
    let mut builder = PromptBuilder::new(&config.prompts_dir)
        .layer("id.md")
        .layer("rules.md");
    if builder.is_empty() {
        tracing::warn!(
            dir = %config.prompts_dir.display(),
            "no prompt layers found, using built-in system instruction"
        );
        builder = builder.append(BUILTIN_INSTRUCTION);
    }
    builder
        .var("bot_name", &config.bot_name)
        .var("language", &config.language)
        .build()
}
