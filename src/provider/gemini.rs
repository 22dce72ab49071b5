//! Google Gemini text client (API key)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::http;
use crate::provider::{Provider, ProviderKind, ProviderPayload, ProviderRequest, TransportConfig};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u32>,
}

fn safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: "BLOCK_MEDIUM_AND_ABOVE",
    })
    .collect()
}

/// Gemini `generateContent` client
pub struct GeminiProvider {
    client: Client,
    transport: TransportConfig,
}

impl GeminiProvider {
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(transport.timeout)?,
            transport,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = http::json_headers();
        if let Some(key) = &self.transport.credential {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert(API_KEY_HEADER, value);
            }
        }
        headers
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        ProviderKind::Gemini.name()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.transport.base_url, request.model);
        debug!(provider = %self.name(), model = %request.model, "Sending generateContent request");

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_tokens,
                top_p: 0.95,
                top_k: 40,
            },
            safety_settings: safety_settings(),
        };

        let result = http::send(
            self.client
                .post(&url)
                .headers(self.headers())
                .timeout(request.budget(self.transport.timeout))
                .json(&body),
        )
        .await;

        // Gemini rejects a bad key with 400 INVALID_ARGUMENT rather than 401
        let response = match result {
            Err(ProviderError::Upstream { status: 400, message })
                if message.contains("API_KEY_INVALID") =>
            {
                return Err(ProviderError::Auth(message));
            }
            other => other?,
        };

        let parsed: GenerateContentResponse = http::read_json(response).await?;

        let first = parsed.candidates.into_iter().next().ok_or(ProviderError::NoOutput)?;
        let text = first
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::NoOutput);
        }

        Ok(ProviderPayload::Text {
            text: text.to_string(),
            tokens_used: parsed.usage_metadata.and_then(|u| u.total_token_count),
        })
    }

    async fn health_check(&self, timeout: Duration) -> bool {
        let url = format!("{}{}", self.transport.base_url, self.transport.health_check_path);
        http::probe(&self.client, &url, self.headers(), timeout).await
    }
}
