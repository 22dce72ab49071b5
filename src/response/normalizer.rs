//! Normalize provider payloads into [`GenerationResult`]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

use crate::error::ProviderError;
use crate::provider::ProviderPayload;
use crate::registry::{Capability, ModelDescriptor};
use crate::response::result::{GenerationOutput, GenerationResult};

/// Characters per token when the backend reports no usage
const CHARS_PER_TOKEN: usize = 4;

/// What the normalizer needs to know about the call that produced a payload
pub struct NormalizeContext<'a> {
    pub descriptor: &'a ModelDescriptor,
    pub provider_name: &'a str,
    pub prompt: &'a str,
    /// Clip length the caller asked for, used when the backend reports none
    pub requested_duration_seconds: Option<u32>,
}

/// Map a provider payload to the canonical result and compute its cost.
///
/// Errors are reported as [`ProviderError`] so the router treats them like any
/// other failed attempt.
pub fn normalize(
    ctx: &NormalizeContext<'_>,
    payload: ProviderPayload,
) -> Result<GenerationResult, ProviderError> {
    let capability = ctx.descriptor.capability();

    let (output, units) = match (capability, payload) {
        (Capability::Text, ProviderPayload::Text { text, tokens_used }) => {
            if text.trim().is_empty() {
                return Err(ProviderError::NoOutput);
            }
            let tokens = tokens_used
                .map(f64::from)
                .unwrap_or_else(|| estimate_tokens(ctx.prompt, &text));
            (GenerationOutput::Text { text }, tokens / 1000.0)
        }
        (
            Capability::Image | Capability::Video,
            ProviderPayload::Base64 {
                data,
                mime_type,
                duration_seconds,
            },
        ) => {
            let (mime_type, bytes) = decode_base64(&data, mime_type)?;
            let units = if capability == Capability::Video {
                duration_seconds
                    .or(ctx.requested_duration_seconds.map(f64::from))
                    .unwrap_or(0.0)
            } else {
                1.0
            };
            (
                GenerationOutput::Binary {
                    data: bytes,
                    mime_type,
                },
                units,
            )
        }
        (capability, ProviderPayload::Text { .. }) => {
            return Err(ProviderError::Decode(format!(
                "expected binary payload for {} generation, got text",
                capability
            )))
        }
        (capability, ProviderPayload::Base64 { .. }) => {
            return Err(ProviderError::Decode(format!(
                "expected text payload for {} generation, got binary",
                capability
            )))
        }
    };

    Ok(GenerationResult {
        output,
        provider_name: ctx.provider_name.to_string(),
        model_id: ctx.descriptor.id.clone(),
        cost_incurred: ctx.descriptor.cost_per_unit * units,
        generated_at: Utc::now(),
    })
}

/// Decode plain base64 or a `data:<mime>;base64,` URL
fn decode_base64(data: &str, mime_type: String) -> Result<(String, Vec<u8>), ProviderError> {
    let (mime_type, encoded) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, encoded) = rest
                .split_once(',')
                .ok_or_else(|| ProviderError::Decode("malformed data URL".to_string()))?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                ProviderError::Decode("data URL is not base64-encoded".to_string())
            })?;
            let mime = if mime.is_empty() { mime_type } else { mime.to_string() };
            (mime, encoded)
        }
        None => (mime_type, data),
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ProviderError::Decode(format!("invalid base64 payload: {}", e)))?;

    if bytes.is_empty() {
        return Err(ProviderError::NoOutput);
    }
    Ok((mime_type, bytes))
}

fn estimate_tokens(prompt: &str, output: &str) -> f64 {
    let chars = prompt.chars().count() + output.chars().count();
    (chars / CHARS_PER_TOKEN) as f64
}
