//! Request handlers for the caller boundary

use tracing::info;

use crate::api::models::{GenerateRequestSpec, GenerateResponse};
use crate::Gateway;

/// Handle one generation request. Every outcome becomes a response; raw
/// transport errors never reach the caller.
pub async fn generate(gateway: &Gateway, spec: GenerateRequestSpec) -> GenerateResponse {
    info!(
        capability = %spec.capability,
        prompt_chars = spec.prompt.chars().count(),
        "Received generation request"
    );

    match gateway.generate(spec.into()).await {
        Ok(result) => result.into(),
        Err(e) => e.into(),
    }
}

/// Parse and handle one JSON-encoded request line
pub async fn generate_json(gateway: &Gateway, line: &str) -> GenerateResponse {
    match serde_json::from_str::<GenerateRequestSpec>(line) {
        Ok(spec) => generate(gateway, spec).await,
        Err(e) => GenerateResponse::invalid_request(e.to_string()),
    }
}
