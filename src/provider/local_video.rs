//! Local Stable Video Diffusion client (no auth)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::http;
use crate::provider::{Provider, ProviderKind, ProviderPayload, ProviderRequest, TransportConfig};

const FPS: u32 = 7;
const DEFAULT_DURATION_SECONDS: u32 = 3;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    num_frames: u32,
    fps: u32,
    seed: i64,
    motion: f32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    data: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a local diffusion server exposing `/api/predict`
pub struct LocalVideoProvider {
    client: Client,
    transport: TransportConfig,
}

impl LocalVideoProvider {
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(transport.timeout)?,
            transport,
        })
    }
}

fn frames_for(duration_seconds: u32) -> u32 {
    duration_seconds.max(1) * FPS
}

#[async_trait]
impl Provider for LocalVideoProvider {
    fn name(&self) -> &str {
        ProviderKind::LocalVideo.name()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalVideo
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let url = format!("{}/api/predict", self.transport.base_url);
        let duration = request.options.duration_seconds.unwrap_or(DEFAULT_DURATION_SECONDS);
        debug!(provider = %self.name(), model = %request.model, duration, "Sending predict request");

        let body = PredictRequest {
            model: &request.model,
            prompt: &request.prompt,
            image: request.options.image_base64.as_deref(),
            num_frames: frames_for(duration),
            fps: FPS,
            seed: -1,
            motion: 1.0,
        };

        let response = http::send(
            self.client
                .post(&url)
                .headers(http::json_headers())
                .timeout(request.budget(self.transport.timeout))
                .json(&body),
        )
        .await?;

        let parsed: PredictResponse = http::read_json(response).await?;
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return Err(ProviderError::Upstream {
                status: 200,
                message: error,
            });
        }

        let data = parsed
            .data
            .into_iter()
            .find(|d| !d.is_empty())
            .ok_or(ProviderError::NoOutput)?;

        Ok(ProviderPayload::Base64 {
            data,
            mime_type: "video/mp4".to_string(),
            duration_seconds: Some(f64::from(duration)),
        })
    }

    async fn health_check(&self, timeout: Duration) -> bool {
        let url = format!("{}{}", self.transport.base_url, self.transport.health_check_path);
        http::probe(&self.client, &url, http::json_headers(), timeout).await
    }
}
