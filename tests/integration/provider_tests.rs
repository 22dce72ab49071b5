//! Provider client integration tests against mocked backends

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gen_routing_gateway::error::ProviderError;
use gen_routing_gateway::provider::{
    GeminiProvider, GenerationOptions, HuggingFaceProvider, LocalVideoProvider, OllamaProvider,
    Provider, ProviderPayload, ProviderRequest, StabilityProvider, TransportConfig,
};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer, credential: Option<&str>) -> TransportConfig {
    TransportConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        credential: credential.map(String::from),
        health_check_path: "/health".to_string(),
    }
}

fn request(model: &str, prompt: &str) -> ProviderRequest {
    ProviderRequest {
        model: model.to_string(),
        prompt: prompt.to_string(),
        options: GenerationOptions::default(),
        deadline: Instant::now() + Duration::from_secs(5),
    }
}

// Gemini

#[tokio::test]
async fn test_gemini_generate_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "Say hi"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Hi"}, {"text": "there"}]}}],
            "usageMetadata": {"totalTokenCount": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(transport(&server, Some("test-key"))).unwrap();
    let payload = provider
        .generate(&request("gemini-2.0-flash", "Say hi"))
        .await
        .unwrap();

    assert_eq!(
        payload,
        ProviderPayload::Text {
            text: "Hi\nthere".to_string(),
            tokens_used: Some(12),
        }
    );
}

#[tokio::test]
async fn test_gemini_invalid_key_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"reason": "API_KEY_INVALID"}]
            }
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(transport(&server, Some("bad-key"))).unwrap();
    let err = provider
        .generate(&request("gemini-2.0-flash", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Auth(_)));
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_no_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(transport(&server, Some("test-key"))).unwrap();
    let err = provider
        .generate(&request("gemini-2.0-flash", "hi"))
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::NoOutput);
}

// Hugging Face

#[tokio::test]
async fn test_huggingface_generate_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/Qwen/Qwen2.5-7B-Instruct"))
        .and(header("authorization", "Bearer hf-token"))
        .and(body_partial_json(json!({
            "inputs": "ترجم",
            "parameters": {"max_new_tokens": 500, "return_full_text": false}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"generated_text": "  translated  "}])),
        )
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(transport(&server, Some("hf-token"))).unwrap();
    let payload = provider
        .generate(&request("Qwen/Qwen2.5-7B-Instruct", "ترجم"))
        .await
        .unwrap();

    assert_eq!(
        payload,
        ProviderPayload::Text {
            text: "translated".to_string(),
            tokens_used: None,
        }
    );
}

#[tokio::test]
async fn test_huggingface_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(transport(&server, Some("bad"))).unwrap();
    let err = provider
        .generate(&request("google/flan-t5-xl", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Auth(_)));
}

#[tokio::test]
async fn test_huggingface_model_loading_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model google/flan-t5-xl is currently loading"
        })))
        .mount(&server)
        .await;

    let provider = HuggingFaceProvider::new(transport(&server, Some("hf-token"))).unwrap();
    let err = provider
        .generate(&request("google/flan-t5-xl", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Upstream { status: 503, .. }));
    assert!(err.is_retryable());
}

// Ollama

#[tokio::test]
async fn test_ollama_generate_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llama3.2:3b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:3b",
            "response": "Hello!",
            "done": true,
            "prompt_eval_count": 5,
            "eval_count": 3
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(transport(&server, None)).unwrap();
    let payload = provider
        .generate(&request("llama3.2:3b", "Say hello"))
        .await
        .unwrap();

    assert_eq!(
        payload,
        ProviderPayload::Text {
            text: "Hello!".to_string(),
            tokens_used: Some(8),
        }
    );
}

#[tokio::test]
async fn test_ollama_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(transport(&server, None)).unwrap();
    let err = provider
        .generate(&request("mistral:7b", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Decode(_)));
}

#[tokio::test]
async fn test_ollama_unreachable_is_connection_error() {
    let provider = OllamaProvider::new(TransportConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout: Duration::from_secs(2),
        credential: None,
        health_check_path: "/api/tags".to_string(),
    })
    .unwrap();

    let err = provider
        .generate(&request("llama3.2:3b", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Connection(_)));
    assert!(!provider.health_check(Duration::from_secs(1)).await);
}

// Stability

#[tokio::test]
async fn test_stability_returns_first_usable_artifact() {
    let server = MockServer::start().await;
    let png = STANDARD.encode(b"\x89PNG");
    Mock::given(method("POST"))
        .and(path(
            "/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image",
        ))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"width": 768, "height": 512, "samples": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artifacts": [
                {"base64": "Zm9v", "finishReason": "CONTENT_FILTERED"},
                {"base64": png.clone(), "finishReason": "SUCCESS"}
            ]
        })))
        .mount(&server)
        .await;

    let provider = StabilityProvider::new(transport(&server, Some("sk-test"))).unwrap();
    let mut req = request("stable-diffusion-xl-1024-v1-0", "a lighthouse");
    req.options.size = Some("768x512".to_string());
    let payload = provider.generate(&req).await.unwrap();

    assert_eq!(
        payload,
        ProviderPayload::Base64 {
            data: png,
            mime_type: "image/png".to_string(),
            duration_seconds: None,
        }
    );
}

#[tokio::test]
async fn test_stability_no_artifacts_is_no_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"artifacts": []})))
        .mount(&server)
        .await;

    let provider = StabilityProvider::new(transport(&server, Some("sk-test"))).unwrap();
    let err = provider
        .generate(&request("stable-diffusion-v1-6", "a cat"))
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::NoOutput);
}

// Local video

#[tokio::test]
async fn test_local_video_generate_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .and(body_partial_json(json!({"num_frames": 28, "fps": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["AAAA"]})))
        .mount(&server)
        .await;

    let provider = LocalVideoProvider::new(transport(&server, None)).unwrap();
    let mut req = request("stable-video-diffusion", "waves at dusk");
    req.options.duration_seconds = Some(4);
    let payload = provider.generate(&req).await.unwrap();

    assert_eq!(
        payload,
        ProviderPayload::Base64 {
            data: "AAAA".to_string(),
            mime_type: "video/mp4".to_string(),
            duration_seconds: Some(4.0),
        }
    );
}

#[tokio::test]
async fn test_local_video_error_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "CUDA out of memory"})),
        )
        .mount(&server)
        .await;

    let provider = LocalVideoProvider::new(transport(&server, None)).unwrap();
    let err = provider
        .generate(&request("zeroscope-v2", "a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Upstream { status: 200, .. }));
}

// Health checks

#[tokio::test]
async fn test_health_check_treats_unauthorized_as_alive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = StabilityProvider::new(transport(&server, Some("sk-test"))).unwrap();
    assert!(provider.health_check(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_health_check_server_error_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(transport(&server, None)).unwrap();
    assert!(!provider.health_check(Duration::from_secs(1)).await);
}
