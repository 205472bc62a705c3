//! Repository trait for enrollments.

use crate::domain::entities::{Enrollment, EnrollmentDetail, NewEnrollment};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for enrollments.
///
/// The repository is the single writer of enrollment rows. Enrollments are
/// never deleted; cancellation only sets `cancelled_at`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgEnrollmentRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryEnrollmentRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Inserts an enrollment atomically and assigns its ID.
    ///
    /// Either the row exists afterwards or it does not; there is no partial write.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the insert fails.
    async fn create(&self, new_enrollment: NewEnrollment) -> Result<Enrollment, AppError>;

    /// Fetches an enrollment joined with its plan and student.
    async fn find_detail_by_id(&self, id: i64) -> Result<Option<EnrollmentDetail>, AppError>;

    /// Lists enrollment details ordered by creation time, oldest first.
    async fn list_details(&self, offset: i64, limit: i64)
    -> Result<Vec<EnrollmentDetail>, AppError>;

    /// Sets `cancelled_at` if it is not set yet.
    ///
    /// Returns `Ok(None)` when the enrollment is missing or already cancelled,
    /// in which case nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the write fails.
    async fn cancel(
        &self,
        id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, AppError>;
}
