//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, authorization and job dispatch. Services consume repository
//! traits and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::enrollment_service::EnrollmentService`] - Enrollment creation, cancellation and listing
//! - [`services::plan_service::PlanService`] - Pricing plan management
//! - [`services::student_service::StudentService`] - Student registration
//! - [`services::auth_service::AuthService`] - API token authentication
//! - [`services::authorization_service::AuthorizationGate`] - Administrator checks
//!
//! The [`worker`] module consumes the notification queue.

pub mod services;
pub mod worker;
