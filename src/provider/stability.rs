//! Stability AI image client (API key)

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::http;
use crate::provider::{Provider, ProviderKind, ProviderPayload, ProviderRequest, TransportConfig};

const DEFAULT_SIDE: u32 = 1024;
const CFG_SCALE: f32 = 7.0;
const STEPS: u32 = 30;

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    #[serde(default)]
    base64: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// `text-to-image` client; the registry's backend model is the engine id
pub struct StabilityProvider {
    client: Client,
    transport: TransportConfig,
}

impl StabilityProvider {
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(transport.timeout)?,
            transport,
        })
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = match &self.transport.credential {
            Some(key) => http::bearer_headers(key),
            None => http::json_headers(),
        };
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl Provider for StabilityProvider {
    fn name(&self) -> &str {
        ProviderKind::Stability.name()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Stability
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.transport.base_url, request.model
        );
        debug!(provider = %self.name(), engine = %request.model, "Sending text-to-image request");

        let (width, height) = request
            .options
            .dimensions()
            .unwrap_or((DEFAULT_SIDE, DEFAULT_SIDE));
        let body = TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: &request.prompt,
                weight: 1.0,
            }],
            cfg_scale: CFG_SCALE,
            height,
            width,
            samples: 1,
            steps: STEPS,
        };

        let response = http::send(
            self.client
                .post(&url)
                .headers(self.headers())
                .timeout(request.budget(self.transport.timeout))
                .json(&body),
        )
        .await?;

        let parsed: TextToImageResponse = http::read_json(response).await?;

        // Filtered artifacts come back blurred; they are not a usable result
        let artifact = parsed
            .artifacts
            .into_iter()
            .find(|a| {
                !a.base64.is_empty() && a.finish_reason.as_deref() != Some("CONTENT_FILTERED")
            })
            .ok_or(ProviderError::NoOutput)?;

        Ok(ProviderPayload::Base64 {
            data: artifact.base64,
            mime_type: "image/png".to_string(),
            duration_seconds: None,
        })
    }

    async fn health_check(&self, timeout: Duration) -> bool {
        let url = format!("{}{}", self.transport.base_url, self.transport.health_check_path);
        http::probe(&self.client, &url, self.headers(), timeout).await
    }
}
