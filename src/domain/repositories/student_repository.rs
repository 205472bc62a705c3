//! Repository trait for student data access.

use crate::domain::entities::{NewStudent, Student, StudentPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for students.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgStudentRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryStudentRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Finds a student by ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, AppError>;

    /// Finds a student by email address (exact match).
    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError>;

    /// Inserts a new student.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    /// Returns [`AppError::Persistence`] if the write fails.
    async fn create(&self, new_student: NewStudent) -> Result<Student, AppError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no student has this ID.
    /// Returns [`AppError::Persistence`] if the write fails.
    async fn update(&self, id: i64, patch: StudentPatch) -> Result<Student, AppError>;
}
