//! Model catalog snapshots and the registry that swaps them

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::provider::ProviderKind;
use crate::registry::model::{Capability, ModelDescriptor, ModelFilter};

/// Immutable per-capability model lists, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub text: Vec<ModelDescriptor>,
    #[serde(default)]
    pub image: Vec<ModelDescriptor>,
    #[serde(default)]
    pub video: Vec<ModelDescriptor>,
}

impl Catalog {
    pub fn models(&self, capability: Capability) -> &[ModelDescriptor] {
        match capability {
            Capability::Text => &self.text,
            Capability::Image => &self.image,
            Capability::Video => &self.video,
        }
    }

    fn models_mut(&mut self, capability: Capability) -> &mut Vec<ModelDescriptor> {
        match capability {
            Capability::Text => &mut self.text,
            Capability::Image => &mut self.image,
            Capability::Video => &mut self.video,
        }
    }

    pub fn find_model(&self, capability: Capability, id: &str) -> Option<&ModelDescriptor> {
        self.models(capability).iter().find(|m| m.id == id)
    }

    /// Lazily yield `(insertion_index, descriptor)` pairs that pass `filter`
    pub fn filter_models<'a>(
        &'a self,
        capability: Capability,
        filter: &'a ModelFilter,
    ) -> impl Iterator<Item = (usize, &'a ModelDescriptor)> + 'a {
        self.models(capability)
            .iter()
            .enumerate()
            .filter(move |(_, m)| filter.matches(m))
    }

    pub fn len(&self) -> usize {
        self.text.len() + self.image.len() + self.video.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check id uniqueness, cost sanity and that each descriptor sits in the catalog matching
    /// its limits and its backend's capability. Locality must agree with the backend.
    pub fn validate(&self) -> Result<()> {
        for capability in Capability::ALL {
            let mut seen = HashSet::new();
            for model in self.models(capability) {
                if model.id.is_empty() {
                    return Err(AppError::InvalidCatalog(format!(
                        "{} catalog contains a model with an empty id",
                        capability
                    )));
                }
                if !seen.insert(model.id.as_str()) {
                    return Err(AppError::InvalidCatalog(format!(
                        "duplicate model id '{}' in {} catalog",
                        model.id, capability
                    )));
                }
                if !model.cost_per_unit.is_finite() || model.cost_per_unit < 0.0 {
                    return Err(AppError::InvalidCatalog(format!(
                        "model '{}' has invalid cost {}",
                        model.id, model.cost_per_unit
                    )));
                }
                if model.capability() != capability {
                    return Err(AppError::InvalidCatalog(format!(
                        "model '{}' has {} limits but is listed under {}",
                        model.id,
                        model.capability(),
                        capability
                    )));
                }
                if model.backend.capability() != capability {
                    return Err(AppError::InvalidCatalog(format!(
                        "model '{}' is served by {} which does not provide {}",
                        model.id, model.backend, capability
                    )));
                }
                if model.is_local != model.backend.is_local() {
                    return Err(AppError::InvalidCatalog(format!(
                        "model '{}' is marked {} but {} is a {} provider",
                        model.id,
                        if model.is_local { "local" } else { "remote" },
                        model.backend,
                        if model.backend.is_local() { "local" } else { "remote" }
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse a catalog from YAML and validate it
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Registry of model catalogs
///
/// Readers take an `Arc` snapshot and never see a partial update; every change
/// builds a new [`Catalog`] and swaps it in under the write lock.
pub struct ModelRegistry {
    catalog: RwLock<Arc<Catalog>>,
}

impl ModelRegistry {
    /// Create a registry from a validated catalog
    pub fn new(catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        Ok(Self {
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    /// Create a registry holding the built-in free-tier catalog
    pub fn with_seed() -> Self {
        Self {
            catalog: RwLock::new(Arc::new(super::seed::seed_catalog())),
        }
    }

    /// Load the catalog from a YAML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::new(Catalog::from_yaml(&content)?)
    }

    /// Current catalog snapshot
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    pub fn list_models(&self, capability: Capability) -> Vec<ModelDescriptor> {
        self.snapshot().models(capability).to_vec()
    }

    pub fn find_model(&self, capability: Capability, id: &str) -> Result<ModelDescriptor> {
        self.snapshot()
            .find_model(capability, id)
            .cloned()
            .ok_or_else(|| AppError::ModelNotFound {
                capability,
                id: id.to_string(),
            })
    }

    /// Replace the whole catalog. An invalid catalog is rejected and the current one kept.
    pub fn reload(&self, catalog: Catalog) -> Result<()> {
        catalog.validate()?;
        let count = catalog.len();
        *self.catalog.write() = Arc::new(catalog);
        info!(models = count, "Model catalog reloaded");
        Ok(())
    }

    pub fn reload_from_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.reload(Catalog::from_yaml(&content)?)
    }

    /// Set the advisory availability flag on every model served by `backend`.
    ///
    /// Returns the number of descriptors whose flag changed; no swap happens when nothing changed.
    pub fn set_provider_availability(&self, backend: ProviderKind, available: bool) -> usize {
        let mut guard = self.catalog.write();

        let stale = |m: &ModelDescriptor| m.backend == backend && m.is_available != available;
        let capability = backend.capability();
        let changed = guard.models(capability).iter().filter(|m| stale(m)).count();
        if changed == 0 {
            return 0;
        }

        let mut next = Catalog::clone(&guard);
        for model in next.models_mut(capability).iter_mut().filter(|m| m.backend == backend) {
            model.is_available = available;
        }
        *guard = Arc::new(next);

        debug!(provider = %backend, available, changed, "Updated model availability");
        changed
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_seed()
    }
}
