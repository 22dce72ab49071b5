//! Error types for the gateway
//!
//! Three layers: [`AppError`] for startup and administrative failures,
//! [`ProviderError`] for a single backend call, and [`GatewayError`] for the
//! terminal outcome of a routed request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::failure::FailureRecord;
use crate::registry::Capability;

/// Crate-level errors raised while building or reconfiguring the gateway
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Model '{id}' not found in {capability} catalog")]
    ModelNotFound { capability: Capability, id: String },

    #[error("Missing credential for {provider}: set {env_var}")]
    MissingCredential { provider: String, env_var: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of one provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Missing or rejected credential. The provider is skipped for the rest of the request.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network failure, client timeout, or an attempt cut short by the request deadline.
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no usable output")]
    NoOutput,
}

/// Wire-level name of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    AuthError,
    ConnectionError,
    UpstreamError,
    DecodeError,
    NoOutputError,
}

impl FailureKind {
    pub const ALL: [FailureKind; 5] = [
        FailureKind::AuthError,
        FailureKind::ConnectionError,
        FailureKind::UpstreamError,
        FailureKind::DecodeError,
        FailureKind::NoOutputError,
    ];

    /// Position in [`FailureKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AuthError => "AuthError",
            FailureKind::ConnectionError => "ConnectionError",
            FailureKind::UpstreamError => "UpstreamError",
            FailureKind::DecodeError => "DecodeError",
            FailureKind::NoOutputError => "NoOutputError",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a failure affects the rest of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Credential problem; the whole provider is dropped from the request.
    Configuration,
    /// Worth trying the next candidate, possibly on the same provider.
    Transient,
    /// This candidate will not succeed; other candidates may.
    Permanent,
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Auth(_) => FailureKind::AuthError,
            ProviderError::Connection(_) => FailureKind::ConnectionError,
            ProviderError::Upstream { .. } => FailureKind::UpstreamError,
            ProviderError::Decode(_) => FailureKind::DecodeError,
            ProviderError::NoOutput => FailureKind::NoOutputError,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::Auth(_) => ErrorClass::Configuration,
            ProviderError::Connection(_) => ErrorClass::Transient,
            ProviderError::Upstream { status, .. } if *status == 429 || *status >= 500 => {
                ErrorClass::Transient
            }
            ProviderError::Upstream { .. } => ErrorClass::Permanent,
            ProviderError::Decode(_) | ProviderError::NoOutput => ErrorClass::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Terminal error of a routed request; the only error callers ever see
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("no model matches the request: {0}")]
    NotFound(String),

    #[error("all {} attempted candidates failed", causes.len())]
    Exhausted { causes: Vec<FailureRecord> },

    #[error("request deadline exceeded after {} attempts", causes.len())]
    TimeoutExceeded { causes: Vec<FailureRecord> },
}

impl GatewayError {
    /// Stable code used at the caller boundary
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::Exhausted { .. } => "EXHAUSTED",
            GatewayError::TimeoutExceeded { .. } => "TIMEOUT",
        }
    }

    pub fn causes(&self) -> &[FailureRecord] {
        match self {
            GatewayError::NotFound(_) => &[],
            GatewayError::Exhausted { causes } | GatewayError::TimeoutExceeded { causes } => causes,
        }
    }
}
