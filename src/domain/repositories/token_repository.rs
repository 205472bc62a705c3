//! Repository trait for API token storage.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A stored API token. Only the HMAC of the raw token is persisted.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Repository interface for API tokens bound to users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Returns the owning user ID of a non-revoked token with this hash.
    async fn find_user_id(&self, token_hash: &str) -> Result<Option<i64>, AppError>;

    /// Updates the `last_used_at` timestamp of a token.
    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError>;

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError>;

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError>;

    /// Revokes a token. Returns `Ok(false)` if it was missing or already revoked.
    async fn revoke_token(&self, id: i64) -> Result<bool, AppError>;
}
