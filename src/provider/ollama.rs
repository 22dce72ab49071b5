//! Ollama local text client (no auth)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::http;
use crate::provider::{Provider, ProviderKind, ProviderPayload, ProviderRequest, TransportConfig};

const DEFAULT_NUM_PREDICT: u32 = 2000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Client for an on-device Ollama server; models are addressed by their Ollama tag
pub struct OllamaProvider {
    client: Client,
    transport: TransportConfig,
}

impl OllamaProvider {
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(transport.timeout)?,
            transport,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        ProviderKind::Ollama.name()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let url = format!("{}/api/generate", self.transport.base_url);
        debug!(provider = %self.name(), model = %request.model, "Sending generate request");

        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                num_predict: request.options.max_tokens.unwrap_or(DEFAULT_NUM_PREDICT),
            },
        };

        let response = http::send(
            self.client
                .post(&url)
                .headers(http::json_headers())
                .timeout(request.budget(self.transport.timeout))
                .json(&body),
        )
        .await?;

        let parsed: GenerateResponse = http::read_json(response).await?;
        if parsed.response.trim().is_empty() {
            return Err(ProviderError::NoOutput);
        }

        let tokens_used = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (prompt, output) => Some(prompt.unwrap_or(0) + output.unwrap_or(0)),
        };

        Ok(ProviderPayload::Text {
            text: parsed.response,
            tokens_used,
        })
    }

    async fn health_check(&self, timeout: Duration) -> bool {
        let url = format!("{}{}", self.transport.base_url, self.transport.health_check_path);
        http::probe(&self.client, &url, http::json_headers(), timeout).await
    }
}
