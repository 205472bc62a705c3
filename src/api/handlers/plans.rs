//! Handlers for plan management endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::dto::pagination::PageParams;
use crate::api::dto::plan::{PlanItem, PlanListResponse};
use crate::api::extract::JsonBody;
use crate::application::services::{PlanInput, PlanUpdateInput};
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Lists plans, 20 per page.
///
/// # Endpoint
///
/// `GET /api/plans?page=1`
pub async fn plan_list_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PlanListResponse>, AppError> {
    let page = params.page();
    let plans = state.plan_service.list_plans(page).await?;

    Ok(Json(PlanListResponse {
        page,
        items: plans.into_iter().map(PlanItem::from).collect(),
    }))
}

/// Creates a plan.
///
/// # Endpoint
///
/// `POST /api/plans`
///
/// ```json
/// { "title": "Gold", "duration_months": 3, "monthly_price": "109.00" }
/// ```
pub async fn create_plan_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<PlanInput>,
) -> Result<(StatusCode, Json<PlanItem>), AppError> {
    let plan = state.plan_service.create_plan(payload, principal).await?;
    Ok((StatusCode::CREATED, Json(plan.into())))
}

/// Updates a plan. All fields are optional.
///
/// # Endpoint
///
/// `PUT /api/plans/{id}`
pub async fn update_plan_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<PlanUpdateInput>,
) -> Result<Json<PlanItem>, AppError> {
    let plan = state
        .plan_service
        .update_plan(id, payload, principal)
        .await?;
    Ok(Json(plan.into()))
}

/// Deletes a plan no enrollment refers to.
///
/// # Endpoint
///
/// `DELETE /api/plans/{id}`
///
/// Returns `204 No Content`, or 409 if enrollments still reference the plan.
pub async fn delete_plan_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.plan_service.delete_plan(id, principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
