//! Handlers for student endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::extract::JsonBody;
use crate::application::services::{StudentInput, StudentUpdateInput};
use crate::domain::entities::{Principal, Student};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a student.
///
/// # Endpoint
///
/// `POST /api/students`
///
/// ```json
/// { "name": "Diego Fernandes", "email": "diego@gym.local", "age": 23, "weight": 60.5, "height": 1.71 }
/// ```
///
/// Returns 409 if the email is already registered.
pub async fn create_student_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<StudentInput>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = state
        .student_service
        .create_student(payload, principal)
        .await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// `GET /api/students/{id}`
pub async fn get_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.student_service.get_student(id).await?))
}

/// Updates a student. All fields are optional.
///
/// # Endpoint
///
/// `PUT /api/students/{id}`
pub async fn update_student_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<StudentUpdateInput>,
) -> Result<Json<Student>, AppError> {
    let student = state
        .student_service
        .update_student(id, payload, principal)
        .await?;
    Ok(Json(student))
}
