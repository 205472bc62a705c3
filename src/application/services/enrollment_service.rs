//! Enrollment lifecycle: creation, cancellation and listing.

use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError};

use crate::application::services::authorization_service::{
    AuthorizationGate, require_administrator,
};
use crate::domain::clock::Clock;
use crate::domain::entities::{Enrollment, EnrollmentDetail, NewEnrollment, Principal};
use crate::domain::jobs::{WELCOME_MAIL_JOB, WelcomeMailPayload};
use crate::domain::repositories::{EnrollmentRepository, PlanRepository, StudentRepository};
use crate::domain::terms::{EnrollmentTerms, parse_start_date, truncate_to_hour};
use crate::error::{AppError, Resource};
use crate::infrastructure::queue::JobQueue;

/// Fixed page size of enrollment listings.
pub const ENROLLMENT_PAGE_SIZE: i64 = 20;

/// Raw input of the creation workflow.
///
/// `start_date` is kept as the caller sent it; parsing is part of validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateEnrollmentInput {
    pub student_id: Option<i64>,

    #[validate(required(message = "plan_id is required"))]
    pub plan_id: Option<i64>,

    #[validate(
        required(message = "start_date is required"),
        custom(function = "validate_start_date")
    )]
    pub start_date: Option<String>,
}

fn validate_start_date(raw: &str) -> Result<(), ValidationError> {
    match parse_start_date(raw) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("date")
            .with_message(Cow::Borrowed("start_date must be a valid date"))),
    }
}

/// Outcome of the welcome-notification enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// The job was durably accepted by the queue.
    Queued { job_id: String },
    /// The queue did not accept the job. The enrollment is committed regardless.
    Unavailable { reason: String },
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct EnrollmentCreated {
    pub enrollment: Enrollment,
    pub notification: NotificationStatus,
}

/// Orchestrates the enrollment workflows.
///
/// Stateless apart from its injected collaborators. Persistence of an
/// enrollment always happens before its welcome job is enqueued, and no job is
/// enqueued when the insert fails.
pub struct EnrollmentService {
    students: Arc<dyn StudentRepository>,
    plans: Arc<dyn PlanRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    gate: Arc<dyn AuthorizationGate>,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl EnrollmentService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        plans: Arc<dyn PlanRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        gate: Arc<dyn AuthorizationGate>,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            students,
            plans,
            enrollments,
            gate,
            queue,
            clock,
        }
    }

    /// Creates an enrollment and enqueues its welcome notification.
    ///
    /// Steps, each of which may short-circuit:
    ///
    /// 1. Validate input shape (`plan_id` present, `start_date` parseable)
    /// 2. Require an administrator principal
    /// 3. Truncate the start to the top of its hour; reject it if in the past
    /// 4. Resolve the student, then the plan
    /// 5. Derive end date and price from the plan
    /// 6. Insert the enrollment
    /// 7. Load the joined detail of the new row and enqueue the welcome job
    ///
    /// An elapsed `deadline` aborts the workflow with [`AppError::Cancelled`]
    /// at the next suspension point before the insert. Once the insert has
    /// started the workflow runs to completion.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed input
    /// - [`AppError::Unauthorized`] for non-administrators
    /// - [`AppError::InvalidDate`] if the normalized start is before now
    /// - [`AppError::NotFound`] for a missing student or plan
    /// - [`AppError::Persistence`] if the insert fails
    /// - [`AppError::Cancelled`] if the deadline elapsed
    ///
    /// A queue failure after the insert is not an error; it is reported as
    /// [`NotificationStatus::Unavailable`].
    pub async fn create_enrollment(
        &self,
        input: CreateEnrollmentInput,
        principal: Principal,
        deadline: Option<Instant>,
    ) -> Result<EnrollmentCreated, AppError> {
        input.validate()?;

        let (Some(plan_id), Some(raw_start)) = (input.plan_id, input.start_date.as_deref()) else {
            return Err(AppError::bad_request("Validation failed", json!({})));
        };
        let requested_start = parse_start_date(raw_start).ok_or_else(|| {
            AppError::bad_request(
                "Validation failed",
                json!({ "fields": { "start_date": ["start_date must be a valid date"] } }),
            )
        })?;

        within(deadline, "authorization", async {
            require_administrator(self.gate.as_ref(), principal).await
        })
        .await?;

        let start_date = truncate_to_hour(requested_start);
        let now = self.clock.now();
        if start_date < now {
            return Err(AppError::invalid_date(
                "Start date is in the past",
                json!({ "start_date": start_date, "now": now }),
            ));
        }

        let student_id = input.student_id;
        let student = match student_id {
            Some(id) => {
                within(deadline, "student_lookup", self.students.find_by_id(id)).await?
            }
            None => None,
        }
        .ok_or_else(|| AppError::not_found(Resource::Student, json!({ "id": student_id })))?;

        let plan = within(deadline, "plan_lookup", self.plans.find_by_id(plan_id))
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Plan, json!({ "id": plan_id })))?;

        let terms = EnrollmentTerms::derive(start_date, &plan).ok_or_else(|| {
            AppError::bad_request(
                "Plan terms yield no valid end date or price",
                json!({ "plan_id": plan.id, "duration_months": plan.duration_months }),
            )
        })?;

        ensure_time_left(deadline, "insert")?;

        let enrollment = self
            .enrollments
            .create(NewEnrollment {
                student_id: student.id,
                plan_id: plan.id,
                start_date: terms.start_date,
                end_date: terms.end_date,
                price: terms.price,
            })
            .await?;

        info!(
            enrollment_id = enrollment.id,
            student_id = student.id,
            plan_id = plan.id,
            "Enrollment created"
        );

        let detail = match self.enrollments.find_detail_by_id(enrollment.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                warn!(enrollment_id = enrollment.id, "Enrollment detail missing after insert");
                EnrollmentDetail::from_parts(&enrollment, &plan, &student)
            }
            Err(e) => {
                warn!(enrollment_id = enrollment.id, error = %e, "Failed to load enrollment detail");
                EnrollmentDetail::from_parts(&enrollment, &plan, &student)
            }
        };

        let notification = self.enqueue_welcome(detail).await;

        Ok(EnrollmentCreated {
            enrollment,
            notification,
        })
    }

    async fn enqueue_welcome(&self, detail: EnrollmentDetail) -> NotificationStatus {
        let enrollment_id = detail.id;

        let payload = match serde_json::to_value(WelcomeMailPayload::new(detail)) {
            Ok(payload) => payload,
            Err(e) => {
                error!(enrollment_id, error = %e, "Failed to encode welcome job");
                return NotificationStatus::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        match self.queue.enqueue(WELCOME_MAIL_JOB, payload).await {
            Ok(job_id) => {
                info!(enrollment_id, job_id = %job_id, "Welcome notification queued");
                NotificationStatus::Queued { job_id }
            }
            Err(e) => {
                warn!(
                    enrollment_id,
                    error = %e,
                    "Welcome notification not queued; enrollment kept"
                );
                NotificationStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Cancels an active enrollment.
    ///
    /// Existence is checked before authorization, and authorization before the
    /// state check. `cancelled_at` is written at most once.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the enrollment does not exist
    /// - [`AppError::Unauthorized`] for non-administrators
    /// - [`AppError::AlreadyCancelled`] if it was cancelled before (including by
    ///   a concurrent request)
    pub async fn cancel_enrollment(
        &self,
        id: i64,
        principal: Principal,
    ) -> Result<EnrollmentDetail, AppError> {
        let mut detail = self
            .enrollments
            .find_detail_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Enrollment, json!({ "id": id })))?;

        require_administrator(self.gate.as_ref(), principal).await?;

        if let Some(cancelled_at) = detail.cancelled_at {
            return Err(AppError::already_cancelled(
                json!({ "id": id, "cancelled_at": cancelled_at }),
            ));
        }

        let cancelled = self
            .enrollments
            .cancel(id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::already_cancelled(json!({ "id": id })))?;

        info!(enrollment_id = id, "Enrollment cancelled");

        detail.cancelled_at = cancelled.cancelled_at;
        Ok(detail)
    }

    /// Lists enrollments with their plan and student, oldest first.
    ///
    /// `page` starts at 1; each page holds [`ENROLLMENT_PAGE_SIZE`] items.
    pub async fn list_enrollments(&self, page: u32) -> Result<Vec<EnrollmentDetail>, AppError> {
        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        let offset = i64::from(page - 1) * ENROLLMENT_PAGE_SIZE;
        self.enrollments
            .list_details(offset, ENROLLMENT_PAGE_SIZE)
            .await
    }
}

fn ensure_time_left(deadline: Option<Instant>, step: &'static str) -> Result<(), AppError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            Err(AppError::cancelled(json!({ "step": step })))
        }
        _ => Ok(()),
    }
}

/// Runs a read step, giving up when the deadline elapses.
async fn within<T, F>(deadline: Option<Instant>, step: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    ensure_time_left(deadline, step)?;

    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| AppError::cancelled(json!({ "step": step })))?,
        None => fut.await,
    }
}
