//! Handlers for enrollment endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tokio::time::Instant;

use crate::api::dto::enrollment::{
    CreateEnrollmentResponse, EnrollmentDetailItem, EnrollmentListResponse,
};
use crate::api::dto::pagination::PageParams;
use crate::api::extract::JsonBody;
use crate::application::services::CreateEnrollmentInput;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Lists enrollments with plan and student, oldest first, 20 per page.
///
/// # Endpoint
///
/// `GET /api/enrollments?page=1`
pub async fn enrollment_list_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<EnrollmentListResponse>, AppError> {
    let page = params.page();
    let items = state.enrollment_service.list_enrollments(page).await?;

    Ok(Json(EnrollmentListResponse {
        page,
        items: items.into_iter().map(EnrollmentDetailItem::from).collect(),
    }))
}

/// Enrolls a student in a plan.
///
/// # Endpoint
///
/// `POST /api/enrollments`
///
/// # Request Body
///
/// ```json
/// {
///   "student_id": 3,
///   "plan_id": 1,
///   "start_date": "2024-03-10T15:37:00Z"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the enrollment and `"notification": "queued"`, or
/// `"notification": "unavailable"` when the welcome mail could not be queued.
/// The enrollment is stored in both cases.
///
/// # Errors
///
/// 400 (validation / past start date), 403 (not an administrator),
/// 404 (student or plan), 408 (deadline elapsed), 500 (write failed).
pub async fn create_enrollment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<CreateEnrollmentInput>,
) -> Result<(StatusCode, Json<CreateEnrollmentResponse>), AppError> {
    let deadline = Instant::now() + state.request_timeout;

    let created = state
        .enrollment_service
        .create_enrollment(payload, principal, Some(deadline))
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Cancels an enrollment.
///
/// # Endpoint
///
/// `DELETE /api/enrollments/{id}`
///
/// # Errors
///
/// 404 if the enrollment does not exist, 403 for non-administrators,
/// 409 if it is already cancelled.
pub async fn cancel_enrollment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<EnrollmentDetailItem>, AppError> {
    let detail = state
        .enrollment_service
        .cancel_enrollment(id, principal)
        .await?;

    Ok(Json(detail.into()))
}
