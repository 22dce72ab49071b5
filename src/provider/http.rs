//! Shared HTTP plumbing for provider clients

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Longest upstream error body kept in a failure message
const MAX_ERROR_BODY: usize = 512;

/// Build a pooled client with the provider's timeout baked in
pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// JSON headers plus `Authorization: Bearer <token>`
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = json_headers();
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

/// Send a request, mapping transport failures and non-success statuses
pub async fn send(request: RequestBuilder) -> std::result::Result<Response, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Connection(format!("request timed out: {}", e))
        } else {
            ProviderError::Connection(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Map a non-success status to a provider error
pub fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = truncate(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth(format!("{}: {}", status, message))
        }
        _ => ProviderError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

/// Read the body and decode it as JSON
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, ProviderError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::Connection(format!("failed to read response body: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Probe `url`; a 401 still means the server is up
pub async fn probe(client: &Client, url: &str, headers: HeaderMap, timeout: Duration) -> bool {
    match client.get(url).headers(headers).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() || response.status().as_u16() == 401 => {
            debug!(url = %url, "Health check passed");
            true
        }
        Ok(response) => {
            debug!(url = %url, status = %response.status(), "Health check failed");
            false
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Health check failed");
            false
        }
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
