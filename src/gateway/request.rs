//! Caller-facing generation request

use std::time::Duration;

use crate::provider::GenerationOptions;
use crate::registry::{Capability, ModelFilter};

/// Selection constraints supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Upper bound on a model's `cost_per_unit`
    pub max_cost_per_unit: Option<f64>,
    /// Soft preference used to order equal-cost candidates
    pub prefer_local: Option<bool>,
    /// Hard locality filter
    pub require_local: Option<bool>,
    pub language: Option<String>,
    pub required_tags: Vec<String>,
}

impl Constraints {
    /// Registry filter for these constraints
    pub fn filter(&self) -> ModelFilter {
        ModelFilter {
            language: self.language.clone(),
            max_cost_per_unit: self.max_cost_per_unit,
            require_local: self.require_local,
            required_tags: self.required_tags.clone(),
        }
    }
}

/// A generation request for one capability
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub capability: Capability,
    pub prompt: String,
    pub constraints: Constraints,
    pub options: GenerationOptions,
    /// End-to-end budget; the router default applies when unset
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    pub fn new(capability: Capability, prompt: impl Into<String>) -> Self {
        Self {
            capability,
            prompt: prompt.into(),
            constraints: Constraints::default(),
            options: GenerationOptions::default(),
            timeout: None,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(Capability::Text, prompt)
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self::new(Capability::Image, prompt)
    }

    pub fn video(prompt: impl Into<String>) -> Self {
        Self::new(Capability::Video, prompt)
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.constraints.language = Some(language.into());
        self
    }

    pub fn with_max_cost(mut self, max_cost_per_unit: f64) -> Self {
        self.constraints.max_cost_per_unit = Some(max_cost_per_unit);
        self
    }

    pub fn prefer_local(mut self, prefer: bool) -> Self {
        self.constraints.prefer_local = Some(prefer);
        self
    }

    pub fn require_local(mut self, local: bool) -> Self {
        self.constraints.require_local = Some(local);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.constraints.required_tags.push(tag.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
