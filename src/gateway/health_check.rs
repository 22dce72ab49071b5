//! Background provider health checking

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::provider::{HealthState, ProviderKind, ProviderPool};
use crate::registry::ModelRegistry;

/// Periodically probes every provider and mirrors the result into the registry's
/// availability flags. Never consulted on the request path.
pub struct HealthCheckManager {
    providers: Arc<ProviderPool>,
    registry: Arc<ModelRegistry>,
    probe_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthCheckManager {
    pub fn new(providers: Arc<ProviderPool>, registry: Arc<ModelRegistry>) -> Self {
        Self::with_probe_timeout(providers, registry, Duration::from_secs(5))
    }

    pub fn with_probe_timeout(
        providers: Arc<ProviderPool>,
        registry: Arc<ModelRegistry>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            registry,
            probe_timeout,
            task: Mutex::new(None),
        }
    }

    /// Probe all providers concurrently once
    pub async fn run_once(&self) {
        let handles = self.providers.handles();
        let probes = handles.iter().map(|handle| {
            let timeout = self.probe_timeout;
            async move {
                let passed = tokio::time::timeout(timeout, handle.client().health_check(timeout))
                    .await
                    .unwrap_or(false);
                (handle, passed)
            }
        });

        for (handle, passed) in join_all(probes).await {
            let was_healthy = handle.is_healthy();
            let healthy = handle.record_probe(passed);
            if was_healthy != healthy {
                if healthy {
                    info!(provider = %handle.name(), "Provider recovered");
                } else {
                    warn!(provider = %handle.name(), "Provider marked unhealthy");
                }
            } else {
                debug!(provider = %handle.name(), passed, "Health probe finished");
            }

            let changed = self.registry.set_provider_availability(handle.kind(), healthy);
            if changed > 0 {
                debug!(provider = %handle.name(), models = changed, available = healthy, "Updated model availability");
            }
        }
    }

    /// Start the periodic task; a running task is replaced
    pub fn start(self: &Arc<Self>, interval_secs: u64) {
        let manager = Arc::clone(self);
        let period = Duration::from_secs(interval_secs.max(1));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                manager.run_once().await;
            }
        });

        if let Some(previous) = self.task.lock().replace(task) {
            previous.abort();
        }
        info!(interval_secs = period.as_secs(), "Health check task started");
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Health check task stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Returns `(total, healthy, unhealthy)`
    pub async fn get_health_summary(&self) -> (usize, usize, usize) {
        let handles = self.providers.handles();
        let healthy = handles.iter().filter(|h| h.is_healthy()).count();
        (handles.len(), healthy, handles.len() - healthy)
    }

    /// Unknown providers count as healthy
    pub fn is_healthy(&self, kind: ProviderKind) -> bool {
        self.providers.get(kind).map_or(true, |h| h.is_healthy())
    }

    pub fn get_status(&self, kind: ProviderKind) -> Option<HealthState> {
        self.providers.get(kind).map(|h| h.health())
    }

    pub fn get_unhealthy_providers(&self) -> Vec<ProviderKind> {
        self.providers
            .handles()
            .iter()
            .filter(|h| !h.is_healthy())
            .map(|h| h.kind())
            .collect()
    }
}
