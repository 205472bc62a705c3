//! PostgreSQL implementations of the domain repositories.

mod pg_enrollment_repository;
mod pg_plan_repository;
mod pg_student_repository;
mod pg_token_repository;
mod pg_user_repository;

pub use pg_enrollment_repository::PgEnrollmentRepository;
pub use pg_plan_repository::PgPlanRepository;
pub use pg_student_repository::PgStudentRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;
