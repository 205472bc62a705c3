//! Repository trait for API users.

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the operators that call the API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already used.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;
}
