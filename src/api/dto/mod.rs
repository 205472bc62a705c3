//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization. Request bodies are the
//! validated input types of the application services.

pub mod enrollment;
pub mod health;
pub mod pagination;
pub mod plan;
