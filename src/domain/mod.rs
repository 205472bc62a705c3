//! Domain layer containing business entities and rules.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`terms`] - Start-date normalization, month arithmetic and pricing
//! - [`jobs`] - Payloads of background jobs
//! - [`clock`] - Injectable time source
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Workflows live in services (see [`crate::application::services`])

pub mod clock;
pub mod entities;
pub mod jobs;
pub mod repositories;
pub mod terms;
