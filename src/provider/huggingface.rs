//! Hugging Face Inference API text client (bearer token)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::http;
use crate::provider::{Provider, ProviderKind, ProviderPayload, ProviderRequest, TransportConfig};

const DEFAULT_MAX_NEW_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

/// The API answers either a list of generations or a single object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generations(Vec<Generation>),
    Single(Generation),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

/// Hosted inference client, model addressed by repository id
pub struct HuggingFaceProvider {
    client: Client,
    transport: TransportConfig,
}

impl HuggingFaceProvider {
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(transport.timeout)?,
            transport,
        })
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        match &self.transport.credential {
            Some(token) => http::bearer_headers(token),
            None => http::json_headers(),
        }
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn name(&self) -> &str {
        ProviderKind::HuggingFace.name()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let url = format!("{}/models/{}", self.transport.base_url, request.model);
        debug!(provider = %self.name(), model = %request.model, "Sending inference request");

        let body = InferenceRequest {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                max_new_tokens: request.options.max_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
                temperature: request.options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                return_full_text: false,
            },
        };

        let response = http::send(
            self.client
                .post(&url)
                .headers(self.headers())
                .timeout(request.budget(self.transport.timeout))
                .json(&body),
        )
        .await?;

        let text = match http::read_json::<InferenceResponse>(response).await? {
            InferenceResponse::Generations(generations) => generations
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .unwrap_or_default(),
            InferenceResponse::Single(generation) => generation.generated_text,
            InferenceResponse::Error { error } => {
                return Err(ProviderError::Upstream {
                    status: 200,
                    message: error,
                })
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::NoOutput);
        }

        Ok(ProviderPayload::Text {
            text: text.to_string(),
            tokens_used: None,
        })
    }

    async fn health_check(&self, timeout: Duration) -> bool {
        let url = format!("{}{}", self.transport.base_url, self.transport.health_check_path);
        http::probe(&self.client, &url, self.headers(), timeout).await
    }
}
