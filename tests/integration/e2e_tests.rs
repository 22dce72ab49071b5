//! End-to-end integration tests

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gen_routing_gateway::api::{self, GenerateResponse};
use gen_routing_gateway::config::Settings;
use gen_routing_gateway::error::{FailureKind, GatewayError};
use gen_routing_gateway::gateway::GenerationRequest;
use gen_routing_gateway::provider::ProviderKind;
use gen_routing_gateway::registry::Capability;
use gen_routing_gateway::Gateway;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings with every provider disabled and environment lookups cleared
fn create_test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.gateway.request_timeout_ms = 10_000;
    for kind in ProviderKind::ALL {
        let provider = settings.providers.get_mut(kind);
        provider.enabled = false;
        provider.base_url_env = None;
        provider.auth.token_env = None;
        provider.timeout_ms = 5_000;
    }
    settings
}

fn enable(settings: &mut Settings, kind: ProviderKind, base_url: &str, key: Option<&str>) {
    let provider = settings.providers.get_mut(kind);
    provider.enabled = true;
    provider.base_url = base_url.to_string();
    provider.auth.api_key = key.map(String::from);
}

#[tokio::test]
async fn test_undecodable_image_exhausts_with_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artifacts": [{"base64": "%%% definitely not base64 %%%", "finishReason": "SUCCESS"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = create_test_settings();
    enable(&mut settings, ProviderKind::Stability, &server.uri(), Some("sk-test"));
    let gateway = Gateway::from_settings(settings).unwrap();

    // Only the SDXL model carries the "anime" style
    let err = gateway
        .generate(GenerationRequest::image("a fox in a forest").with_tag("anime"))
        .await
        .unwrap_err();

    match err {
        GatewayError::Exhausted { causes } => {
            assert_eq!(causes.len(), 1);
            assert_eq!(causes[0].provider, "stability");
            assert_eq!(causes[0].model, "stable-diffusion-xl");
            assert_eq!(causes[0].kind, FailureKind::DecodeError);
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failing_local_provider_falls_back_to_remote() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/gemini-2\.0-flash:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "مرحبا بالعالم"}]}}],
            "usageMetadata": {"totalTokenCount": 9}
        })))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&gemini)
        .await;

    let mut settings = create_test_settings();
    enable(&mut settings, ProviderKind::Ollama, "http://127.0.0.1:1", None);
    enable(&mut settings, ProviderKind::Gemini, &gemini.uri(), Some("test-key"));
    let gateway = Gateway::from_settings(settings).unwrap();

    // Health checks mark the local server down; routing still tries it
    for _ in 0..3 {
        gateway.health_manager.run_once().await;
    }
    assert!(!gateway.health_manager.is_healthy(ProviderKind::Ollama));
    assert!(gateway.health_manager.is_healthy(ProviderKind::Gemini));

    let result = gateway
        .generate(
            GenerationRequest::text("Say hello in Arabic")
                .with_language("ar")
                .with_max_cost(0.0)
                .prefer_local(true),
        )
        .await
        .unwrap();

    assert_eq!(result.provider_name, "gemini");
    assert_eq!(result.model_id, "gemini-2.0-flash");
    assert_eq!(result.text(), Some("مرحبا بالعالم"));
    assert_eq!(result.cost_incurred, 0.0);
}

#[tokio::test]
async fn test_fallback_causes_reported_through_api() {
    let mut settings = create_test_settings();
    enable(&mut settings, ProviderKind::Ollama, "http://127.0.0.1:1", None);
    let gateway = Gateway::from_settings(settings).unwrap();

    let line = json!({
        "capability": "text",
        "prompt": "hello",
        "constraints": {"language": "ar", "requireLocal": true},
        "timeoutMs": 5000
    })
    .to_string();

    let response = api::generate_json(&gateway, &line).await;
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "EXHAUSTED");
    let causes = value["causes"].as_array().unwrap();
    // llama-3.2-3b and qwen2.5-7b are the local Arabic models
    assert_eq!(causes.len(), 2);
    assert!(causes
        .iter()
        .all(|c| c["provider"] == "ollama" && c["kind"] == "ConnectionError"));
}

#[tokio::test]
async fn test_video_success_through_api() {
    let server = MockServer::start().await;
    let clip = STANDARD.encode(b"fake-mp4");
    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [clip.clone()]})))
        .mount(&server)
        .await;

    let mut settings = create_test_settings();
    enable(&mut settings, ProviderKind::LocalVideo, &server.uri(), None);
    let gateway = Gateway::from_settings(settings).unwrap();

    let line = json!({
        "capability": "video",
        "prompt": "waves at dusk",
        "options": {"durationSeconds": 2}
    })
    .to_string();

    match api::generate_json(&gateway, &line).await {
        GenerateResponse::Success(success) => {
            assert!(success.success);
            assert_eq!(success.provider, "local_svd");
            assert_eq!(success.model, "stable-video-diffusion");
            assert_eq!(success.video_base64.as_deref(), Some(clip.as_str()));
            assert!(success.image_base64.is_none());
        }
        GenerateResponse::Failure(failure) => panic!("unexpected failure: {:?}", failure),
    }
}

#[tokio::test]
async fn test_no_configured_provider_is_not_found() {
    let gateway = Gateway::from_settings(create_test_settings()).unwrap();

    let err = gateway
        .generate(GenerationRequest::video("a cat").with_timeout(Duration::from_secs(1)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert!(err.causes().is_empty());

    // The catalog itself is still served
    assert_eq!(gateway.registry.list_models(Capability::Video).len(), 3);
}

#[tokio::test]
async fn test_invalid_request_line() {
    let gateway = Gateway::from_settings(create_test_settings()).unwrap();

    let response = api::generate_json(&gateway, "{\"capability\":\"audio\"}").await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "INVALID_REQUEST");
}
