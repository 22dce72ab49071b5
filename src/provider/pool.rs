//! Provider pool for managing the live provider handles

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ProvidersConfig;
use crate::error::{AppError, FailureKind};
use crate::provider::{create_provider, Provider, ProviderKind};
use crate::registry::Capability;

/// Failed probes in a row before a provider is reported unhealthy
const UNHEALTHY_THRESHOLD: u32 = 3;

/// Health of one provider as seen by periodic checks
#[derive(Debug, Clone)]
pub struct HealthState {
    pub healthy: bool,
    pub last_check: Option<Instant>,
    pub consecutive_failures: u32,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            healthy: true,
            last_check: None,
            consecutive_failures: 0,
        }
    }

    pub fn mark_healthy(&mut self) {
        self.healthy = true;
        self.last_check = Some(Instant::now());
        self.consecutive_failures = 0;
    }

    pub fn mark_unhealthy(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= UNHEALTHY_THRESHOLD {
            self.healthy = false;
        }
        self.last_check = Some(Instant::now());
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing counters of one provider, fed by every attempt the router makes
#[derive(Debug, Default)]
pub struct ProviderStats {
    attempts: AtomicU64,
    successes: AtomicU64,
    fallback_successes: AtomicU64,
    failures: [AtomicU64; FailureKind::ALL.len()],
    last_used: Mutex<Option<DateTime<Utc>>>,
}

impl ProviderStats {
    /// Count a served request; `after_fallback` when earlier candidates failed first
    pub fn record_success(&self, after_fallback: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        if after_fallback {
            self.fallback_successes.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_used.lock() = Some(Utc::now());
    }

    pub fn record_failure(&self, kind: FailureKind) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.failures[kind.index()].fetch_add(1, Ordering::Relaxed);
        *self.last_used.lock() = Some(Utc::now());
    }

    pub fn snapshot(&self, provider: &str) -> ProviderStatsSnapshot {
        let failures_by_kind: HashMap<FailureKind, u64> = FailureKind::ALL
            .iter()
            .map(|kind| (*kind, self.failures[kind.index()].load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        ProviderStatsSnapshot {
            provider: provider.to_string(),
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: failures_by_kind.values().sum(),
            failures_by_kind,
            fallback_successes: self.fallback_successes.load(Ordering::Relaxed),
            last_used: *self.last_used.lock(),
        }
    }
}

/// Point-in-time copy of [`ProviderStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatsSnapshot {
    pub provider: String,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub failures_by_kind: HashMap<FailureKind, u64>,
    /// Requests this provider served after another candidate had failed
    pub fallback_successes: u64,
    pub last_used: Option<DateTime<Utc>>,
}

impl ProviderStatsSnapshot {
    /// Share of attempts that succeeded, 0.0 when never attempted
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.failures_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// One live backend connection shared by all requests
pub struct ProviderHandle {
    client: Arc<dyn Provider>,
    health: RwLock<HealthState>,
    stats: ProviderStats,
}

impl ProviderHandle {
    pub fn new(client: Arc<dyn Provider>) -> Self {
        Self {
            client,
            health: RwLock::new(HealthState::new()),
            stats: ProviderStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.client.name()
    }

    pub fn kind(&self) -> ProviderKind {
        self.client.kind()
    }

    pub fn capability(&self) -> Capability {
        self.client.capability()
    }

    pub fn client(&self) -> &Arc<dyn Provider> {
        &self.client
    }

    pub fn health(&self) -> HealthState {
        self.health.read().clone()
    }

    pub fn is_healthy(&self) -> bool {
        self.health.read().healthy
    }

    pub fn stats(&self) -> &ProviderStats {
        &self.stats
    }

    pub fn stats_snapshot(&self) -> ProviderStatsSnapshot {
        self.stats.snapshot(self.name())
    }

    /// Record a probe result; returns the resulting health flag
    pub fn record_probe(&self, passed: bool) -> bool {
        let mut health = self.health.write();
        if passed {
            health.mark_healthy();
        } else {
            health.mark_unhealthy();
        }
        health.healthy
    }
}

/// Registry of constructed provider clients, keyed by kind
pub struct ProviderPool {
    handles: DashMap<ProviderKind, Arc<ProviderHandle>>,
}

impl ProviderPool {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self {
            handles: DashMap::new(),
        }
    }

    /// Build every enabled provider. Providers lacking a credential are left out.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let pool = Self::new();

        for kind in ProviderKind::ALL {
            let provider_config = config.get(kind);
            if !provider_config.enabled {
                info!(provider = %kind, "Skipping disabled provider");
                continue;
            }

            match create_provider(kind, provider_config) {
                Ok(client) => {
                    pool.insert(client);
                    info!(provider = %kind, capability = %kind.capability(), "Registered provider");
                }
                Err(AppError::MissingCredential { env_var, .. }) => {
                    warn!(
                        provider = %kind,
                        env_var = %env_var,
                        "Credential missing, provider omitted from candidate pool"
                    );
                }
                Err(e) => {
                    warn!(provider = %kind, error = %e, "Failed to create provider");
                }
            }
        }

        pool
    }

    /// Add or replace the client for its kind
    pub fn insert(&self, client: Arc<dyn Provider>) {
        let kind = client.kind();
        if self
            .handles
            .insert(kind, Arc::new(ProviderHandle::new(client)))
            .is_some()
        {
            debug!(provider = %kind, "Replaced provider handle");
        }
    }

    /// Get the handle for a provider kind
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<ProviderHandle>> {
        self.handles.get(&kind).map(|r| r.value().clone())
    }

    /// All handles, ordered by kind
    pub fn handles(&self) -> Vec<Arc<ProviderHandle>> {
        let mut handles: Vec<_> = self.handles.iter().map(|r| r.value().clone()).collect();
        handles.sort_by_key(|h| h.kind());
        handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.handles.contains_key(&kind)
    }

    /// Routing counters of every provider, ordered by kind
    pub fn stats(&self) -> Vec<ProviderStatsSnapshot> {
        self.handles().iter().map(|h| h.stats_snapshot()).collect()
    }

    pub fn provider_stats(&self, kind: ProviderKind) -> Option<ProviderStatsSnapshot> {
        self.get(kind).map(|h| h.stats_snapshot())
    }
}

impl Default for ProviderPool {
    fn default() -> Self {
        Self::new()
    }
}
