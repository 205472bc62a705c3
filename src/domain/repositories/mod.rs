//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - PostgreSQL implementations live in `crate::infrastructure::persistence`
//! - In-process implementations live in `crate::infrastructure::memory`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`StudentRepository`] - Student lookup and registration
//! - [`PlanRepository`] - Pricing plan management
//! - [`EnrollmentRepository`] - Enrollment persistence and joined details
//! - [`UserRepository`] - API operators and their administrator flag
//! - [`TokenRepository`] - API token authentication

pub mod enrollment_repository;
pub mod plan_repository;
pub mod student_repository;
pub mod token_repository;
pub mod user_repository;

pub use enrollment_repository::EnrollmentRepository;
pub use plan_repository::PlanRepository;
pub use student_repository::StudentRepository;
pub use token_repository::{ApiToken, TokenRepository};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use enrollment_repository::MockEnrollmentRepository;
#[cfg(test)]
pub use plan_repository::MockPlanRepository;
#[cfg(test)]
pub use student_repository::MockStudentRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
