//! Candidate selection and sequential fallback

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ErrorClass, GatewayError, ProviderError};
use crate::gateway::failure::FailureAggregator;
use crate::gateway::request::GenerationRequest;
use crate::provider::{GenerationOptions, ProviderKind, ProviderPool, ProviderRequest};
use crate::registry::{Capability, ModelDescriptor, ModelLimits, ModelRegistry};
use crate::response::{normalize, GenerationResult, NormalizeContext};

/// Router settings
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Budget for requests that carry no timeout of their own
    pub default_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(300),
        }
    }
}

/// A model eligible for a request, in dispatch order
#[derive(Debug, Clone)]
pub struct Candidate {
    pub descriptor: ModelDescriptor,
    /// Position in the capability catalog
    pub index: usize,
}

impl Candidate {
    pub fn provider(&self) -> ProviderKind {
        self.descriptor.backend
    }

    pub fn model_id(&self) -> &str {
        &self.descriptor.id
    }
}

/// Routes requests across the registry's candidates
pub struct Router {
    registry: Arc<ModelRegistry>,
    providers: Arc<ProviderPool>,
    config: RouterConfig,
}

impl Router {
    pub fn new(registry: Arc<ModelRegistry>, providers: Arc<ProviderPool>) -> Self {
        Self::with_config(registry, providers, RouterConfig::default())
    }

    pub fn with_config(
        registry: Arc<ModelRegistry>,
        providers: Arc<ProviderPool>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            providers,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn providers(&self) -> &Arc<ProviderPool> {
        &self.providers
    }

    /// Filtered candidates ordered by cost, then locality preference, then catalog order.
    pub fn plan(&self, request: &GenerationRequest) -> Vec<Candidate> {
        let catalog = self.registry.snapshot();
        let filter = request.constraints.filter();

        let mut candidates: Vec<Candidate> = catalog
            .filter_models(request.capability, &filter)
            .map(|(index, descriptor)| Candidate {
                descriptor: descriptor.clone(),
                index,
            })
            .collect();

        let prefer_local = request.constraints.prefer_local;
        candidates.sort_by(|a, b| {
            a.descriptor
                .cost_per_unit
                .total_cmp(&b.descriptor.cost_per_unit)
                .then_with(|| locality_rank(a, prefer_local).cmp(&locality_rank(b, prefer_local)))
                .then_with(|| a.index.cmp(&b.index))
        });

        candidates
    }

    /// Serve a request from the first candidate that succeeds
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, GatewayError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate",
            request_id = %request_id,
            capability = %request.capability
        );
        self.route(request).instrument(span).await
    }

    async fn route(&self, request: GenerationRequest) -> Result<GenerationResult, GatewayError> {
        let budget = request.timeout.unwrap_or(self.config.default_timeout);
        let deadline = Instant::now() + budget;

        let candidates = self.plan(&request);
        if candidates.is_empty() {
            info!("No model satisfies the request constraints");
            return Err(GatewayError::NotFound(format!(
                "no {} model satisfies the request constraints",
                request.capability
            )));
        }
        if !candidates.iter().any(|c| self.providers.contains(c.provider())) {
            warn!(
                candidates = candidates.len(),
                "No configured provider serves any matching model"
            );
            return Err(GatewayError::NotFound(format!(
                "no configured provider serves a matching {} model",
                request.capability
            )));
        }

        debug!(candidates = candidates.len(), budget_ms = budget.as_millis() as u64, "Routing request");

        let mut failures = FailureAggregator::new();
        let mut excluded: Vec<ProviderKind> = Vec::new();

        for (position, candidate) in candidates.iter().enumerate() {
            let kind = candidate.provider();
            if excluded.contains(&kind) {
                debug!(provider = %kind, model = %candidate.model_id(), "Provider excluded for this request");
                continue;
            }
            let Some(handle) = self.providers.get(kind) else {
                debug!(provider = %kind, model = %candidate.model_id(), "Provider not configured, skipping");
                continue;
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(attempts = failures.len(), "Request deadline exceeded");
                return Err(failures.into_timeout());
            }

            if !candidate.descriptor.is_available {
                debug!(provider = %kind, model = %candidate.model_id(), "Attempting model flagged unavailable");
            }

            let provider_request = ProviderRequest {
                model: candidate.descriptor.wire_model().to_string(),
                prompt: request.prompt.clone(),
                options: fit_options(&request.options, &candidate.descriptor),
                deadline,
            };

            let outcome = match tokio::time::timeout(
                remaining,
                handle.client().generate(&provider_request),
            )
            .await
            {
                Ok(Ok(payload)) => {
                    let ctx = NormalizeContext {
                        descriptor: &candidate.descriptor,
                        provider_name: handle.name(),
                        prompt: &request.prompt,
                        requested_duration_seconds: provider_request.options.duration_seconds,
                    };
                    normalize(&ctx, payload)
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ProviderError::Connection(format!(
                    "attempt exceeded the remaining request budget of {} ms",
                    remaining.as_millis()
                ))),
            };

            match outcome {
                Ok(result) => {
                    handle.stats().record_success(!failures.is_empty());
                    info!(
                        provider = %handle.name(),
                        model = %candidate.model_id(),
                        attempts = failures.len() + 1,
                        cost = result.cost_incurred,
                        "Generation succeeded"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        provider = %handle.name(),
                        model = %candidate.model_id(),
                        kind = %e.kind(),
                        error = %e,
                        "Generation attempt failed"
                    );
                    handle.stats().record_failure(e.kind());
                    failures.record(handle.name(), candidate.model_id(), &e);
                    if e.class() == ErrorClass::Configuration {
                        excluded.push(kind);
                    }
                }
            }

            let untried = candidates[position + 1..]
                .iter()
                .any(|c| !excluded.contains(&c.provider()) && self.providers.contains(c.provider()));
            if untried && Instant::now() >= deadline {
                warn!(attempts = failures.len(), "Request deadline exceeded");
                return Err(failures.into_timeout());
            }
        }

        warn!(attempts = failures.len(), "All candidates failed");
        Err(failures.into_exhausted())
    }
}

/// 0 when the candidate matches the locality preference
fn locality_rank(candidate: &Candidate, prefer_local: Option<bool>) -> u8 {
    match prefer_local {
        Some(prefer) if candidate.descriptor.is_local != prefer => 1,
        _ => 0,
    }
}

/// Clamp caller options to the model's limits and fill capability defaults
fn fit_options(options: &GenerationOptions, descriptor: &ModelDescriptor) -> GenerationOptions {
    let mut fitted = options.clone();
    match descriptor.capability() {
        Capability::Text => {
            if let ModelLimits::Text { max_tokens } = descriptor.limits {
                fitted.max_tokens = Some(fitted.max_tokens.map_or(max_tokens, |t| t.min(max_tokens)));
            }
        }
        Capability::Image => {
            if fitted.size.is_none() {
                fitted.size = descriptor.resolution().map(str::to_string);
            }
        }
        Capability::Video => {
            if let Some(max) = descriptor.max_duration_seconds() {
                fitted.duration_seconds =
                    Some(fitted.duration_seconds.map_or(max, |d| d.min(max)));
            }
        }
    }
    fitted
}
