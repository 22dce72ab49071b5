//! Provider clients - One capability-scoped client per backend
//!
//! The set of clients is closed: [`ProviderKind`] names every implementation and
//! [`create_provider`] is the only way to build one from configuration.

pub mod gemini;
pub mod http;
pub mod huggingface;
pub mod local_video;
pub mod ollama;
pub mod pool;
pub mod stability;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ProviderConfig;
use crate::error::{AppError, ProviderError, Result};
use crate::registry::Capability;

pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use local_video::LocalVideoProvider;
pub use ollama::OllamaProvider;
pub use pool::{
    HealthState, ProviderHandle, ProviderPool, ProviderStats, ProviderStatsSnapshot,
};
pub use stability::StabilityProvider;

/// Typed discriminant of every provider client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Remote text API, API key
    Gemini,
    /// Remote text inference API, bearer token
    HuggingFace,
    /// Local text inference server, no auth
    Ollama,
    /// Remote image API, API key
    Stability,
    /// Local Stable Video Diffusion server, no auth
    LocalVideo,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Gemini,
        ProviderKind::HuggingFace,
        ProviderKind::Ollama,
        ProviderKind::Stability,
        ProviderKind::LocalVideo,
    ];

    /// Stable identifier, also used as the provider name in results and failure records
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Stability => "stability",
            ProviderKind::LocalVideo => "local_svd",
        }
    }

    /// Key of this provider's section under `providers` in the configuration
    pub fn config_key(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Stability => "stability",
            ProviderKind::LocalVideo => "local_video",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            ProviderKind::Gemini | ProviderKind::HuggingFace | ProviderKind::Ollama => {
                Capability::Text
            }
            ProviderKind::Stability => Capability::Image,
            ProviderKind::LocalVideo => Capability::Video,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Ollama | ProviderKind::LocalVideo)
    }

    pub fn requires_credential(&self) -> bool {
        matches!(
            self,
            ProviderKind::Gemini | ProviderKind::HuggingFace | ProviderKind::Stability
        )
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved transport settings of one provider
#[derive(Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub credential: Option<String>,
    pub health_check_path: String,
}

impl TransportConfig {
    /// Resolve base URL and credential from configuration and the environment.
    ///
    /// Fails with [`AppError::MissingCredential`] when the provider needs a credential
    /// and none is configured.
    pub fn resolve(kind: ProviderKind, config: &ProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| config.base_url.clone());

        let credential = match &config.auth.api_key {
            Some(key) if !key.is_empty() => Some(key.clone()),
            _ => config
                .auth
                .token_env
                .as_deref()
                .and_then(|env| std::env::var(env).ok())
                .filter(|token| !token.trim().is_empty()),
        };

        if kind.requires_credential() && credential.is_none() {
            return Err(AppError::MissingCredential {
                provider: kind.name().to_string(),
                env_var: config
                    .auth
                    .token_env
                    .clone()
                    .unwrap_or_else(|| "auth.api_key".to_string()),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            credential,
            health_check_path: config.health_check_path.clone(),
        })
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("health_check_path", &self.health_check_path)
            .finish()
    }
}

/// Tuning knobs forwarded to the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Image size as `WIDTHxHEIGHT`
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// Conditioning image for image-to-video backends
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl GenerationOptions {
    /// Parse `size` into width and height
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.size.as_deref()?.split_once('x')?;
        Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
    }
}

/// One call to a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Backend model name (already mapped from the registry id)
    pub model: String,
    pub prompt: String,
    pub options: GenerationOptions,
    /// End of the overall request budget
    pub deadline: Instant,
}

impl ProviderRequest {
    /// Budget left for this call, capped by the client's own timeout
    pub fn budget(&self, client_timeout: Duration) -> Duration {
        self.deadline
            .saturating_duration_since(Instant::now())
            .min(client_timeout)
    }
}

/// Raw success payload of a provider, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPayload {
    Text {
        text: String,
        /// Total tokens when the backend reports usage
        tokens_used: Option<u32>,
    },
    Base64 {
        data: String,
        mime_type: String,
        /// Clip length for video payloads
        duration_seconds: Option<f64>,
    },
}

/// Capability-scoped provider client
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    fn capability(&self) -> Capability {
        self.kind().capability()
    }

    /// Perform one generation call
    async fn generate(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderPayload, ProviderError>;

    /// Liveness probe used by the background availability updater
    async fn health_check(&self, timeout: Duration) -> bool;
}

/// Create the client for `kind` from configuration
pub fn create_provider(kind: ProviderKind, config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    let transport = TransportConfig::resolve(kind, config)?;
    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(transport)?),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceProvider::new(transport)?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(transport)?),
        ProviderKind::Stability => Arc::new(StabilityProvider::new(transport)?),
        ProviderKind::LocalVideo => Arc::new(LocalVideoProvider::new(transport)?),
    };
    Ok(provider)
}
