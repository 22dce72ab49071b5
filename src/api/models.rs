//! Caller-boundary request and response models (camelCase JSON)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, GatewayError};
use crate::gateway::{Constraints, FailureRecord, GenerationRequest};
use crate::provider::GenerationOptions;
use crate::registry::Capability;
use crate::response::{GenerationOutput, GenerationResult};

/// Generation request as received from a caller
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequestSpec {
    pub capability: Capability,
    pub prompt: String,
    #[serde(default)]
    pub constraints: ConstraintsSpec,
    #[serde(default)]
    pub options: GenerationOptions,
    /// End-to-end budget in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_local: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_local: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tags: Vec<String>,
}

impl From<GenerateRequestSpec> for GenerationRequest {
    fn from(spec: GenerateRequestSpec) -> Self {
        GenerationRequest {
            capability: spec.capability,
            prompt: spec.prompt,
            constraints: Constraints {
                max_cost_per_unit: spec.constraints.max_cost_per_unit,
                prefer_local: spec.constraints.prefer_local,
                require_local: spec.constraints.require_local,
                language: spec.constraints.language.filter(|l| !l.is_empty()),
                required_tags: spec.constraints.required_tags,
            },
            options: spec.options,
            timeout: spec.timeout_ms.map(std::time::Duration::from_millis),
        }
    }
}

/// Response returned to the caller
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

impl GenerateResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerateResponse::Success(_))
    }

    /// Response for a request that could not be parsed
    pub fn invalid_request(message: impl Into<String>) -> Self {
        GenerateResponse::Failure(FailureResponse {
            success: false,
            error: "INVALID_REQUEST".to_string(),
            message: message.into(),
            causes: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    pub provider: String,
    pub model: String,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub success: bool,
    /// `EXHAUSTED`, `TIMEOUT` or `NOT_FOUND`; `INVALID_REQUEST` for unparseable input
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub causes: Vec<CauseSpec>,
}

/// One failed attempt as reported to the caller
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CauseSpec {
    pub provider: String,
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FailureRecord> for CauseSpec {
    fn from(record: &FailureRecord) -> Self {
        Self {
            provider: record.provider.clone(),
            model: record.model.clone(),
            kind: record.kind,
            message: record.message.clone(),
        }
    }
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let mut response = SuccessResponse {
            success: true,
            provider: result.provider_name,
            model: result.model_id,
            cost: result.cost_incurred,
            text: None,
            image_base64: None,
            video_base64: None,
            mime_type: None,
            generated_at: result.generated_at,
        };

        match result.output {
            GenerationOutput::Text { text } => response.text = Some(text),
            GenerationOutput::Binary { data, mime_type } => {
                let encoded = STANDARD.encode(data);
                if mime_type.starts_with("video/") {
                    response.video_base64 = Some(encoded);
                } else {
                    response.image_base64 = Some(encoded);
                }
                response.mime_type = Some(mime_type);
            }
        }

        GenerateResponse::Success(response)
    }
}

impl From<GatewayError> for GenerateResponse {
    fn from(error: GatewayError) -> Self {
        GenerateResponse::Failure(FailureResponse {
            success: false,
            error: error.code().to_string(),
            message: error.to_string(),
            causes: error.causes().iter().map(CauseSpec::from).collect(),
        })
    }
}
