//! Gen Routing Gateway
//!
//! Routes text, image and video generation requests across local and remote
//! providers, choosing the cheapest model that satisfies the caller's
//! constraints and falling back across candidates on failure.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod registry;
pub mod response;

pub use error::{AppError, GatewayError, ProviderError, Result};

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::gateway::{GenerationRequest, HealthCheckManager, Router, RouterConfig};
use crate::provider::{ProviderPool, ProviderStatsSnapshot};
use crate::registry::ModelRegistry;
use crate::response::GenerationResult;

/// The assembled gateway: registry, provider pool, router and health checks
pub struct Gateway {
    pub settings: Arc<Settings>,
    pub registry: Arc<ModelRegistry>,
    pub providers: Arc<ProviderPool>,
    pub router: Arc<Router>,
    pub health_manager: Arc<HealthCheckManager>,
}

impl Gateway {
    /// Build every component from configuration
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let registry = match settings.gateway.catalog_path.as_deref() {
            Some(path) => {
                info!(path = %path, "Loading model catalog");
                ModelRegistry::from_path(path)?
            }
            None => ModelRegistry::with_seed(),
        };
        let providers = ProviderPool::from_config(&settings.providers);
        info!(
            models = registry.snapshot().len(),
            providers = providers.len(),
            "Gateway components initialized"
        );

        Ok(Self::new(settings, Arc::new(registry), Arc::new(providers)))
    }

    /// Assemble a gateway from already-built parts
    pub fn new(
        settings: Settings,
        registry: Arc<ModelRegistry>,
        providers: Arc<ProviderPool>,
    ) -> Self {
        let router = Router::with_config(
            registry.clone(),
            providers.clone(),
            RouterConfig {
                default_timeout: Duration::from_millis(settings.gateway.request_timeout_ms),
            },
        );
        let health_manager = HealthCheckManager::with_probe_timeout(
            providers.clone(),
            registry.clone(),
            Duration::from_millis(settings.gateway.health_check_timeout_ms),
        );

        Self {
            settings: Arc::new(settings),
            registry,
            providers,
            router: Arc::new(router),
            health_manager: Arc::new(health_manager),
        }
    }

    /// Start background health checking at the configured interval
    pub fn start_health_checks(&self) {
        self.health_manager
            .start(self.settings.gateway.health_check_interval_secs);
    }

    /// Routing counters of every configured provider
    pub fn provider_stats(&self) -> Vec<ProviderStatsSnapshot> {
        self.providers.stats()
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResult, GatewayError> {
        self.router.generate(request).await
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.health_manager.stop();
    }
}
