//! Repository trait for pricing plans.

use crate::domain::entities::{NewPlan, Plan, PlanPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for plans.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgPlanRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryPlanRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Plan>, AppError>;

    /// Lists plans ordered by creation time, oldest first.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Plan>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the write fails.
    async fn create(&self, new_plan: NewPlan) -> Result<Plan, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no plan has this ID.
    async fn update(&self, id: i64, patch: PlanPatch) -> Result<Plan, AppError>;

    /// Deletes a plan. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if enrollments still reference the plan.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
