//! Plan entity: a priced membership duration template.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A pricing plan students can be enrolled in.
///
/// `duration_months` is always at least 1. Enrollments snapshot the values they
/// derive from a plan, so later edits never affect existing enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub title: String,
    pub duration_months: i32,
    pub monthly_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(
        id: i64,
        title: String,
        duration_months: i32,
        monthly_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            duration_months,
            monthly_price,
            created_at,
        }
    }

    /// Total price of the whole plan duration, `None` on decimal overflow.
    pub fn total_price(&self) -> Option<Decimal> {
        self.monthly_price
            .checked_mul(Decimal::from(self.duration_months))
    }
}

/// Input data for creating a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    pub title: String,
    pub duration_months: i32,
    pub monthly_price: Decimal,
}

/// Partial update for a plan. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanPatch {
    pub title: Option<String>,
    pub duration_months: Option<i32>,
    pub monthly_price: Option<Decimal>,
}

impl PlanPatch {
    pub fn apply(&self, plan: &Plan) -> Plan {
        Plan {
            title: self.title.clone().unwrap_or_else(|| plan.title.clone()),
            duration_months: self.duration_months.unwrap_or(plan.duration_months),
            monthly_price: self.monthly_price.unwrap_or(plan.monthly_price),
            ..plan.clone()
        }
    }
}
