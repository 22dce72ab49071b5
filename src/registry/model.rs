//! Model descriptors and capability types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::provider::ProviderKind;

/// Kind of generation a catalog (and a provider) serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Text,
    Image,
    Video,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Text, Capability::Image, Capability::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Image => "image",
            Capability::Video => "video",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability-specific limits of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelLimits {
    Text { max_tokens: u32 },
    /// Output size as `WIDTHxHEIGHT`
    Image { resolution: String },
    Video { max_duration_seconds: u32 },
}

impl ModelLimits {
    pub fn capability(&self) -> Capability {
        match self {
            ModelLimits::Text { .. } => Capability::Text,
            ModelLimits::Image { .. } => Capability::Image,
            ModelLimits::Video { .. } => Capability::Video,
        }
    }
}

/// One offering inside a capability catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique within its capability catalog
    pub id: String,
    pub name: String,
    /// Owning organization, for display
    pub provider: String,
    /// Client that serves this model
    pub backend: ProviderKind,
    /// The backend's own name for the model when it differs from `id`
    #[serde(default)]
    pub backend_model: Option<String>,
    pub limits: ModelLimits,
    /// Per 1K tokens, per image, or per second of video. Zero means free.
    #[serde(default)]
    pub cost_per_unit: f64,
    /// Supported language codes. Empty means language-agnostic.
    #[serde(default)]
    pub languages: BTreeSet<String>,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub is_local: bool,
    /// Advisory only; refreshed by health checks and overridden by dispatch failures
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl ModelDescriptor {
    pub fn capability(&self) -> Capability {
        self.limits.capability()
    }

    /// Name to send on the wire to the serving backend
    pub fn wire_model(&self) -> &str {
        self.backend_model.as_deref().unwrap_or(&self.id)
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.contains(language)
    }

    pub fn has_tags<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().all(|t| self.capabilities.contains(t))
    }

    pub fn max_duration_seconds(&self) -> Option<u32> {
        match self.limits {
            ModelLimits::Video { max_duration_seconds } => Some(max_duration_seconds),
            _ => None,
        }
    }

    pub fn resolution(&self) -> Option<&str> {
        match &self.limits {
            ModelLimits::Image { resolution } => Some(resolution),
            _ => None,
        }
    }
}

/// Constraints applied by [`Catalog::filter_models`](super::Catalog::filter_models)
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub language: Option<String>,
    pub max_cost_per_unit: Option<f64>,
    /// Hard locality filter; `None` accepts both
    pub require_local: Option<bool>,
    pub required_tags: Vec<String>,
}

impl ModelFilter {
    pub fn matches(&self, model: &ModelDescriptor) -> bool {
        if let Some(language) = &self.language {
            if !model.supports_language(language) {
                return false;
            }
        }
        if let Some(max_cost) = self.max_cost_per_unit {
            if model.cost_per_unit > max_cost {
                return false;
            }
        }
        if let Some(local) = self.require_local {
            if model.is_local != local {
                return false;
            }
        }
        model.has_tags(&self.required_tags)
    }
}
