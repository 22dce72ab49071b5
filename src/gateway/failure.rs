//! Failure aggregation across the fallback chain

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, GatewayError, ProviderError};

/// One failed attempt, identified by the candidate that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub provider: String,
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Collects failures in attempt order
#[derive(Debug, Default)]
pub struct FailureAggregator {
    records: Vec<FailureRecord>,
}

impl FailureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, provider: &str, model: &str, error: &ProviderError) {
        self.records.push(FailureRecord {
            provider: provider.to_string(),
            model: model.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn into_exhausted(self) -> GatewayError {
        GatewayError::Exhausted {
            causes: self.records,
        }
    }

    pub fn into_timeout(self) -> GatewayError {
        GatewayError::TimeoutExceeded {
            causes: self.records,
        }
    }
}
