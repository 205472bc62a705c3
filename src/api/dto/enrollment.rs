//! DTOs for enrollment endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::application::services::{EnrollmentCreated, NotificationStatus};
use crate::domain::entities::{Enrollment, EnrollmentDetail, EnrollmentState};

/// Core fields of an enrollment.
#[derive(Debug, Serialize)]
pub struct EnrollmentItem {
    pub id: i64,
    pub student_id: i64,
    pub plan_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Decimal,
    pub state: EnrollmentState,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentItem {
    fn from(e: Enrollment) -> Self {
        Self {
            state: e.state(),
            id: e.id,
            student_id: e.student_id,
            plan_id: e.plan_id,
            start_date: e.start_date,
            end_date: e.end_date,
            price: e.price,
            cancelled_at: e.cancelled_at,
            created_at: e.created_at,
        }
    }
}

/// Whether the welcome notification was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Queued,
    Unavailable,
}

/// Response of `POST /api/enrollments`.
#[derive(Debug, Serialize)]
pub struct CreateEnrollmentResponse {
    #[serde(flatten)]
    pub enrollment: EnrollmentItem,
    pub notification: NotificationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl From<EnrollmentCreated> for CreateEnrollmentResponse {
    fn from(created: EnrollmentCreated) -> Self {
        let (notification, job_id) = match created.notification {
            NotificationStatus::Queued { job_id } => (NotificationState::Queued, Some(job_id)),
            NotificationStatus::Unavailable { .. } => (NotificationState::Unavailable, None),
        };

        Self {
            enrollment: created.enrollment.into(),
            notification,
            job_id,
        }
    }
}

/// An enrollment joined with its plan and student.
#[derive(Debug, Serialize)]
pub struct EnrollmentDetailItem {
    #[serde(flatten)]
    pub detail: EnrollmentDetail,
    pub state: EnrollmentState,
}

impl From<EnrollmentDetail> for EnrollmentDetailItem {
    fn from(detail: EnrollmentDetail) -> Self {
        Self {
            state: detail.state(),
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentListResponse {
    pub page: u32,
    pub items: Vec<EnrollmentDetailItem>,
}
