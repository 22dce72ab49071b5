//! Gateway core - Routing, fallback and availability tracking

pub mod failure;
pub mod health_check;
pub mod request;
pub mod router;

pub use failure::{FailureAggregator, FailureRecord};
pub use health_check::HealthCheckManager;
pub use request::{Constraints, GenerationRequest};
pub use router::{Candidate, Router, RouterConfig};
