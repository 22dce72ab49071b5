//! Unit tests for configuration module

use gen_routing_gateway::config::{ProviderConfig, Settings};
use gen_routing_gateway::provider::ProviderKind;
use std::io::Write;

fn yaml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.gateway.request_timeout_ms, 300_000);
    assert_eq!(settings.gateway.health_check_interval_secs, 30);
    assert_eq!(settings.logging.format, "json");
    assert_eq!(settings.get_enabled_providers().len(), ProviderKind::ALL.len());
}

#[test]
fn test_missing_file_uses_defaults() {
    let settings = Settings::load_from_path("/nonexistent/gateway.yaml").unwrap();

    assert_eq!(settings.providers.ollama.base_url, "http://localhost:11434");
    assert_eq!(
        settings.providers.gemini.auth.token_env.as_deref(),
        Some("GEMINI_API_KEY")
    );
    assert_eq!(
        settings.providers.local_video.base_url_env.as_deref(),
        Some("SVD_API_URL")
    );
}

#[test]
fn test_yaml_overrides_merge_with_defaults() {
    let file = yaml_file(
        r#"
gateway:
  request_timeout_ms: 1500
providers:
  ollama:
    base_url: "http://gpu-box:11434"
  stability:
    enabled: false
"#,
    );

    let settings = Settings::load_from_path(file.path()).unwrap();

    assert_eq!(settings.gateway.request_timeout_ms, 1500);
    assert_eq!(settings.providers.ollama.base_url, "http://gpu-box:11434");
    assert_eq!(settings.providers.ollama.timeout_ms, 300_000);
    assert!(!settings.providers.stability.enabled);
    assert!(!settings
        .get_enabled_providers()
        .contains(&ProviderKind::Stability));
}

#[test]
fn test_environment_override() {
    std::env::set_var("GEN_GATEWAY__LOGGING__LEVEL", "debug");
    let settings = Settings::load_from_path("/nonexistent/gateway.yaml").unwrap();
    std::env::remove_var("GEN_GATEWAY__LOGGING__LEVEL");

    assert_eq!(settings.logging.level, "debug");
}

#[test]
fn test_zero_request_timeout_rejected() {
    let file = yaml_file("gateway:\n  request_timeout_ms: 0\n");
    assert!(Settings::load_from_path(file.path()).is_err());
}

#[test]
fn test_invalid_base_url_rejected() {
    let mut settings = Settings::default();
    settings.providers.gemini.base_url = "not a url".to_string();
    assert!(settings.validate().is_err());

    settings.providers.gemini.enabled = false;
    assert!(settings.validate().is_ok());
}

#[test]
fn test_provider_defaults() {
    let hf = ProviderConfig::defaults_for(ProviderKind::HuggingFace);
    assert_eq!(hf.timeout_ms, 120_000);
    assert_eq!(hf.auth.token_env.as_deref(), Some("HUGGINGFACE_TOKEN"));

    let ollama = ProviderConfig::defaults_for(ProviderKind::Ollama);
    assert!(ollama.auth.token_env.is_none());
    assert_eq!(ollama.base_url_env.as_deref(), Some("OLLAMA_HOST"));
}
