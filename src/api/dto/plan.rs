//! DTOs for plan management.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::Plan;

/// A plan together with its total price.
#[derive(Debug, Serialize)]
pub struct PlanItem {
    pub id: i64,
    pub title: String,
    pub duration_months: i32,
    pub monthly_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl From<Plan> for PlanItem {
    fn from(plan: Plan) -> Self {
        Self {
            total_price: plan.total_price(),
            id: plan.id,
            title: plan.title,
            duration_months: plan.duration_months,
            monthly_price: plan.monthly_price,
            created_at: plan.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub page: u32,
    pub items: Vec<PlanItem>,
}
