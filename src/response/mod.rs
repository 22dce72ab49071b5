//! Response module - Canonical results and payload normalization

pub mod normalizer;
pub mod result;

pub use normalizer::{normalize, NormalizeContext};
pub use result::{GenerationOutput, GenerationResult, OutputKind};
