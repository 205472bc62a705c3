//! Enrollment entity: a student bound to a plan for a computed time window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Plan, Student};

/// Lifecycle state of an enrollment.
///
/// `Active` is the initial state; the single transition is `Active -> Cancelled`,
/// and `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    Active,
    Cancelled,
}

/// A persisted enrollment.
///
/// `start_date` is aligned to the top of the hour, `end_date` and `price` are
/// snapshotted from the plan at creation time and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub plan_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Decimal,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn state(&self) -> EnrollmentState {
        if self.cancelled_at.is_some() {
            EnrollmentState::Cancelled
        } else {
            EnrollmentState::Active
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == EnrollmentState::Cancelled
    }
}

/// Input data for inserting an enrollment. All derived fields are already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnrollment {
    pub student_id: i64,
    pub plan_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Decimal,
}

/// Plan fields embedded in an enrollment detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: i64,
    pub title: String,
    pub duration_months: i32,
    pub monthly_price: Decimal,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            title: plan.title.clone(),
            duration_months: plan.duration_months,
            monthly_price: plan.monthly_price,
        }
    }
}

/// Student fields embedded in an enrollment detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
}

impl From<&Student> for StudentSummary {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            email: student.email.clone(),
            age: student.age,
            weight: student.weight,
            height: student.height,
        }
    }
}

/// An enrollment joined with its plan and student.
///
/// This is the snapshot carried by welcome-mail jobs and returned by listing
/// and cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentDetail {
    pub id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Decimal,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub plan: PlanSummary,
    pub student: StudentSummary,
}

impl EnrollmentDetail {
    pub fn from_parts(enrollment: &Enrollment, plan: &Plan, student: &Student) -> Self {
        Self {
            id: enrollment.id,
            start_date: enrollment.start_date,
            end_date: enrollment.end_date,
            price: enrollment.price,
            cancelled_at: enrollment.cancelled_at,
            created_at: enrollment.created_at,
            plan: PlanSummary::from(plan),
            student: StudentSummary::from(student),
        }
    }

    pub fn state(&self) -> EnrollmentState {
        if self.cancelled_at.is_some() {
            EnrollmentState::Cancelled
        } else {
            EnrollmentState::Active
        }
    }
}
