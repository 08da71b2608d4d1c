//! Tests for system prompt layers in config/prompts

use std::fs;

#[test]
fn test_id_prompt_file_exists() {
    let path = "config/prompts/id.md";
    assert!(fs::metadata(path).is_ok(), "id.md prompt file missing");
}

#[test]
fn test_rules_prompt_file_exists() {
    let path = "config/prompts/rules.md";
    assert!(fs::metadata(path).is_ok(), "rules.md prompt file missing");
}

#[test]
fn test_id_prompt_template_vars() {
    let text = fs::read_to_string("config/prompts/id.md").unwrap();
    assert!(text.contains("{{bot_name}}"), "id.md should contain {{bot_name}} variable");
}

#[test]
fn test_rules_prompt_template_vars() {
    let text = fs::read_to_string("config/prompts/rules.md").unwrap();
    assert!(text.contains("{{language}}"), "rules.md should contain {{language}} variable");
}

#[test]
fn test_rules_prompt_requires_prescription_warning() {
    let text = fs::read_to_string("config/prompts/rules.md").unwrap();
    assert!(text.contains("prescrição veterinária"));
}

#[test]
fn test_default_config_parses() {
    let cfg = bolota::config::load_from(std::path::Path::new("config/default.toml"), None, None).unwrap();
    assert_eq!(cfg.bot_name, "Bolota");
    assert_eq!(cfg.llm.provider, "gemini");
    assert_eq!(cfg.active_model(), "gemini-2.5-flash");
    assert_eq!(cfg.server.bind, "0.0.0.0:3000");
}
