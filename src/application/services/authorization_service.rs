//! Administrator capability checks for mutating operations.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::Principal;
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Decides whether a principal may perform gated mutations.
///
/// Implementations fail closed: an unknown principal or a failed lookup is
/// reported as "not an administrator".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn is_administrator(&self, principal: Principal) -> bool;
}

/// Returns [`AppError::Unauthorized`] unless the principal is an administrator.
pub async fn require_administrator(
    gate: &dyn AuthorizationGate,
    principal: Principal,
) -> Result<(), AppError> {
    if gate.is_administrator(principal).await {
        Ok(())
    } else {
        Err(AppError::unauthorized(
            "Administrator privileges required",
            json!({ "principal": principal.id() }),
        ))
    }
}

/// Gate backed by the `administrator` flag of the user record.
pub struct UserAuthorizationGate {
    users: Arc<dyn UserRepository>,
}

impl UserAuthorizationGate {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AuthorizationGate for UserAuthorizationGate {
    async fn is_administrator(&self, principal: Principal) -> bool {
        match self.users.find_by_id(principal.id()).await {
            Ok(Some(user)) => user.administrator,
            Ok(None) => false,
            Err(e) => {
                warn!(principal = principal.id(), error = %e, "Administrator lookup failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;
    use crate::domain::repositories::MockUserRepository;
    use chrono::Utc;

    fn user(administrator: bool) -> User {
        User {
            id: 1,
            name: "Operator".to_string(),
            email: "ops@gym.local".to_string(),
            administrator,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_administrator_is_allowed() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(Some(user(true))));

        let gate = UserAuthorizationGate::new(Arc::new(repo));
        assert!(gate.is_administrator(Principal(1)).await);
    }

    #[tokio::test]
    async fn test_regular_user_is_denied() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(user(false))));

        let gate = UserAuthorizationGate::new(Arc::new(repo));
        assert!(!gate.is_administrator(Principal(1)).await);
    }

    #[tokio::test]
    async fn test_unknown_principal_is_denied() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let gate = UserAuthorizationGate::new(Arc::new(repo));
        assert!(!gate.is_administrator(Principal(42)).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let gate = UserAuthorizationGate::new(Arc::new(repo));
        let result = require_administrator(&gate, Principal(1)).await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }
}
