//! Canonical generation result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminant of [`GenerationOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Text,
    Binary,
}

/// Output of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_kind", rename_all = "lowercase")]
pub enum GenerationOutput {
    Text {
        text: String,
    },
    Binary {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
        mime_type: String,
    },
}

/// Result returned regardless of which provider served the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(flatten)]
    pub output: GenerationOutput,
    pub provider_name: String,
    pub model_id: String,
    pub cost_incurred: f64,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn output_kind(&self) -> OutputKind {
        match self.output {
            GenerationOutput::Text { .. } => OutputKind::Text,
            GenerationOutput::Binary { .. } => OutputKind::Binary,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.output {
            GenerationOutput::Text { text } => Some(text),
            GenerationOutput::Binary { .. } => None,
        }
    }

    pub fn binary(&self) -> Option<&[u8]> {
        match &self.output {
            GenerationOutput::Binary { data, .. } => Some(data),
            GenerationOutput::Text { .. } => None,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match &self.output {
            GenerationOutput::Binary { mime_type, .. } => Some(mime_type),
            GenerationOutput::Text { .. } => None,
        }
    }
}

/// Binary data as standard base64 on the wire
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
