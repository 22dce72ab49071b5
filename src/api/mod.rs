//! Caller boundary - JSON request/response models and the generate handler

pub mod handlers;
pub mod models;

pub use handlers::{generate, generate_json};
pub use models::{
    CauseSpec, ConstraintsSpec, FailureResponse, GenerateRequestSpec, GenerateResponse,
    SuccessResponse,
};
