//! Model registry - Capability catalogs of model descriptors

pub mod catalog;
pub mod model;
pub mod seed;

pub use catalog::{Catalog, ModelRegistry};
pub use model::{Capability, ModelDescriptor, ModelFilter, ModelLimits};
