//! Pricing plan management.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::application::services::authorization_service::{
    AuthorizationGate, require_administrator,
};
use crate::domain::entities::{NewPlan, Plan, PlanPatch, Principal};
use crate::domain::repositories::PlanRepository;
use crate::error::{AppError, Resource};

pub const PLAN_PAGE_SIZE: i64 = 20;

/// Largest monthly price the `NUMERIC(12, 2)` column holds.
pub const MAX_MONTHLY_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("monthly_price must not be negative")));
    }
    if *price > MAX_MONTHLY_PRICE {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("monthly_price must not exceed 9999999999.99")));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("scale")
            .with_message(Cow::Borrowed("monthly_price must have at most 2 decimal places")));
    }
    Ok(())
}

/// Input for creating a plan.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlanInput {
    #[validate(required, length(min = 1, max = 120))]
    pub title: Option<String>,

    #[validate(required, range(min = 1, max = 120))]
    pub duration_months: Option<i32>,

    #[validate(required, custom(function = "validate_price"))]
    pub monthly_price: Option<Decimal>,
}

/// Partial plan update. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlanUpdateInput {
    #[validate(length(min = 1, max = 120))]
    pub title: Option<String>,

    #[validate(range(min = 1, max = 120))]
    pub duration_months: Option<i32>,

    #[validate(custom(function = "validate_price"))]
    pub monthly_price: Option<Decimal>,
}

pub struct PlanService {
    plans: Arc<dyn PlanRepository>,
    gate: Arc<dyn AuthorizationGate>,
}

impl PlanService {
    pub fn new(plans: Arc<dyn PlanRepository>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { plans, gate }
    }

    /// Lists plans, oldest first, [`PLAN_PAGE_SIZE`] per page. Not gated.
    pub async fn list_plans(&self, page: u32) -> Result<Vec<Plan>, AppError> {
        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        let offset = i64::from(page - 1) * PLAN_PAGE_SIZE;
        self.plans.list(offset, PLAN_PAGE_SIZE).await
    }

    pub async fn create_plan(&self, input: PlanInput, principal: Principal) -> Result<Plan, AppError> {
        input.validate()?;
        require_administrator(self.gate.as_ref(), principal).await?;

        let (Some(title), Some(duration_months), Some(monthly_price)) =
            (input.title, input.duration_months, input.monthly_price)
        else {
            return Err(AppError::bad_request("Validation failed", json!({})));
        };

        let plan = self
            .plans
            .create(NewPlan {
                title,
                duration_months,
                monthly_price,
            })
            .await?;

        info!(plan_id = plan.id, "Plan created");
        Ok(plan)
    }

    /// Updates a plan. Existing enrollments keep their snapshotted terms.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the plan does not exist.
    pub async fn update_plan(
        &self,
        id: i64,
        input: PlanUpdateInput,
        principal: Principal,
    ) -> Result<Plan, AppError> {
        input.validate()?;
        require_administrator(self.gate.as_ref(), principal).await?;

        if self.plans.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(Resource::Plan, json!({ "id": id })));
        }

        let patch = PlanPatch {
            title: input.title,
            duration_months: input.duration_months,
            monthly_price: input.monthly_price,
        };

        let plan = self.plans.update(id, patch).await?;
        info!(plan_id = id, "Plan updated");
        Ok(plan)
    }

    /// Deletes a plan that no enrollment references.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the plan does not exist
    /// - [`AppError::Unauthorized`] for non-administrators
    /// - [`AppError::Conflict`] if enrollments still reference the plan
    pub async fn delete_plan(&self, id: i64, principal: Principal) -> Result<(), AppError> {
        if self.plans.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(Resource::Plan, json!({ "id": id })));
        }

        require_administrator(self.gate.as_ref(), principal).await?;

        if !self.plans.delete(id).await? {
            return Err(AppError::not_found(Resource::Plan, json!({ "id": id })));
        }

        info!(plan_id = id, "Plan deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::authorization_service::MockAuthorizationGate;
    use crate::domain::repositories::MockPlanRepository;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn gate(allowed: bool) -> Arc<MockAuthorizationGate> {
        let mut gate = MockAuthorizationGate::new();
        gate.expect_is_administrator().returning(move |_| allowed);
        Arc::new(gate)
    }

    fn gold() -> Plan {
        Plan::new(1, "Gold".to_string(), 3, dec!(109), Utc::now())
    }

    fn valid_input() -> PlanInput {
        PlanInput {
            title: Some("Gold".to_string()),
            duration_months: Some(3),
            monthly_price: Some(dec!(109)),
        }
    }

    #[tokio::test]
    async fn test_create_plan() {
        let mut repo = MockPlanRepository::new();
        repo.expect_create()
            .withf(|p| p.title == "Gold" && p.duration_months == 3)
            .times(1)
            .returning(|_| Ok(gold()));

        let service = PlanService::new(Arc::new(repo), gate(true));
        let plan = service.create_plan(valid_input(), Principal(1)).await.unwrap();

        assert_eq!(plan.total_price(), Some(dec!(327)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_values() {
        let service = PlanService::new(Arc::new(MockPlanRepository::new()), gate(true));

        let zero_months = PlanInput {
            duration_months: Some(0),
            ..valid_input()
        };
        assert!(matches!(
            service.create_plan(zero_months, Principal(1)).await,
            Err(AppError::Validation { .. })
        ));

        let negative = PlanInput {
            monthly_price: Some(dec!(-1)),
            ..valid_input()
        };
        assert!(matches!(
            service.create_plan(negative, Principal(1)).await,
            Err(AppError::Validation { .. })
        ));

        let untitled = PlanInput {
            title: None,
            ..valid_input()
        };
        assert!(matches!(
            service.create_plan(untitled, Principal(1)).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(MAX_MONTHLY_PRICE, dec!(9999999999.99));
        assert!(validate_price(&dec!(0)).is_ok());
        assert!(validate_price(&dec!(9999999999.99)).is_ok());
        assert!(validate_price(&dec!(10000000000)).is_err());
        assert!(validate_price(&Decimal::MAX).is_err());
    }

    #[test]
    fn test_price_scale() {
        assert!(validate_price(&dec!(10.05)).is_ok());
        assert!(validate_price(&dec!(10.050)).is_ok());
        assert!(validate_price(&dec!(10.005)).is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_oversized_price() {
        let mut repo = MockPlanRepository::new();
        repo.expect_update().times(0);

        let service = PlanService::new(Arc::new(repo), gate(true));
        let input = PlanUpdateInput {
            monthly_price: Some(dec!(79228162514264337593543950335)),
            ..Default::default()
        };
        let result = service.update_plan(1, input, Principal(1)).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_requires_administrator() {
        let mut repo = MockPlanRepository::new();
        repo.expect_create().times(0);

        let service = PlanService::new(Arc::new(repo), gate(false));
        let result = service.create_plan(valid_input(), Principal(2)).await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_plan() {
        let mut repo = MockPlanRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().times(0);

        let service = PlanService::new(Arc::new(repo), gate(true));
        let result = service
            .update_plan(9, PlanUpdateInput::default(), Principal(1))
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_checks_existence_before_authorization() {
        let mut repo = MockPlanRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let mut gate = MockAuthorizationGate::new();
        gate.expect_is_administrator().times(0);

        let service = PlanService::new(Arc::new(repo), Arc::new(gate));
        let result = service.delete_plan(9, Principal(2)).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_referenced_plan_conflicts() {
        let mut repo = MockPlanRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(Some(gold())));
        repo.expect_delete()
            .returning(|_| Err(AppError::conflict("Record is still referenced", json!({}))));

        let service = PlanService::new(Arc::new(repo), gate(true));
        let result = service.delete_plan(1, Principal(1)).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_pages() {
        let mut repo = MockPlanRepository::new();
        repo.expect_list()
            .withf(|offset, limit| *offset == 20 && *limit == 20)
            .returning(|_, _| Ok(vec![gold()]));

        let service = PlanService::new(Arc::new(repo), gate(false));
        assert_eq!(service.list_plans(2).await.unwrap().len(), 1);
    }
}
