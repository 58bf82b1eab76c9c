// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod utils;

pub use auth::{Actor, AdminCapability, AuthError, AuthUser, HasAuthContext};
pub use entity_ids::*;
pub use error::PipelineError;
pub use id::Id;
