//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers, providing concrete implementations for data persistence, the
//! notification job queue and outbound mail.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`memory`] - In-process repository implementations
//! - [`queue`] - Job queue (Redis reliable queue and in-memory implementation)
//! - [`mail`] - Mail transports (HTTP mail API and logging)

pub mod mail;
pub mod memory;
pub mod persistence;
pub mod queue;
