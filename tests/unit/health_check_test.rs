//! Unit tests for health check manager

use async_trait::async_trait;
use gen_routing_gateway::error::ProviderError;
use gen_routing_gateway::gateway::health_check::HealthCheckManager;
use gen_routing_gateway::provider::{
    Provider, ProviderKind, ProviderPayload, ProviderPool, ProviderRequest,
};
use gen_routing_gateway::registry::{Capability, ModelRegistry};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct ProbeStub {
    kind: ProviderKind,
    alive: AtomicBool,
    probes: AtomicUsize,
}

impl ProbeStub {
    fn new(kind: ProviderKind, alive: bool) -> Arc<Self> {
        Arc::new(Self {
            kind,
            alive: AtomicBool::new(alive),
            probes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Provider for ProbeStub {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, _request: &ProviderRequest) -> Result<ProviderPayload, ProviderError> {
        Err(ProviderError::NoOutput)
    }

    async fn health_check(&self, _timeout: Duration) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.alive.load(Ordering::SeqCst)
    }
}

fn setup(stubs: &[Arc<ProbeStub>]) -> (Arc<ModelRegistry>, HealthCheckManager) {
    let pool = Arc::new(ProviderPool::new());
    for stub in stubs {
        pool.insert(stub.clone());
    }
    let registry = Arc::new(ModelRegistry::with_seed());
    let manager = HealthCheckManager::new(pool, registry.clone());
    (registry, manager)
}

#[tokio::test]
async fn test_health_manager_creation() {
    let (_, manager) = setup(&[]);

    // Unknown providers are assumed healthy
    assert!(manager.is_healthy(ProviderKind::Gemini));
    assert!(manager.get_status(ProviderKind::Gemini).is_none());
}

#[tokio::test]
async fn test_health_summary_empty() {
    let (_, manager) = setup(&[]);
    let (total, healthy, unhealthy) = manager.get_health_summary().await;

    assert_eq!(total, 0);
    assert_eq!(healthy, 0);
    assert_eq!(unhealthy, 0);
    assert!(manager.get_unhealthy_providers().is_empty());
}

#[tokio::test]
async fn test_unhealthy_after_consecutive_failures() {
    let ollama = ProbeStub::new(ProviderKind::Ollama, false);
    let gemini = ProbeStub::new(ProviderKind::Gemini, true);
    let (registry, manager) = setup(&[ollama.clone(), gemini.clone()]);

    manager.run_once().await;
    manager.run_once().await;
    assert!(manager.is_healthy(ProviderKind::Ollama));
    assert_eq!(
        manager
            .get_status(ProviderKind::Ollama)
            .unwrap()
            .consecutive_failures,
        2
    );

    manager.run_once().await;
    assert!(!manager.is_healthy(ProviderKind::Ollama));
    assert_eq!(manager.get_unhealthy_providers(), vec![ProviderKind::Ollama]);
    assert_eq!(ollama.probes.load(Ordering::SeqCst), 3);
    assert_eq!(gemini.probes.load(Ordering::SeqCst), 3);

    let (total, healthy, unhealthy) = manager.get_health_summary().await;
    assert_eq!((total, healthy, unhealthy), (2, 1, 1));

    for model in registry.list_models(Capability::Text) {
        let expected = model.backend != ProviderKind::Ollama;
        assert_eq!(model.is_available, expected, "{}", model.id);
    }
}

#[tokio::test]
async fn test_recovery_restores_availability() {
    let ollama = ProbeStub::new(ProviderKind::Ollama, false);
    let (registry, manager) = setup(&[ollama.clone()]);

    for _ in 0..3 {
        manager.run_once().await;
    }
    assert!(!registry
        .find_model(Capability::Text, "llama-3.2-3b")
        .unwrap()
        .is_available);

    ollama.alive.store(true, Ordering::SeqCst);
    manager.run_once().await;

    assert!(manager.is_healthy(ProviderKind::Ollama));
    assert!(registry
        .find_model(Capability::Text, "llama-3.2-3b")
        .unwrap()
        .is_available);
}

#[tokio::test]
async fn test_background_task_start_stop() {
    let stub = ProbeStub::new(ProviderKind::LocalVideo, true);
    let (_, manager) = setup(&[stub.clone()]);
    let manager = Arc::new(manager);

    manager.start(1);
    assert!(manager.is_running());

    // The first interval tick fires immediately
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stub.probes.load(Ordering::SeqCst) >= 1);

    manager.stop();
    assert!(!manager.is_running());
}
