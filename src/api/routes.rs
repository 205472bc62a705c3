//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    cancel_enrollment_handler, create_enrollment_handler, create_plan_handler,
    create_student_handler, delete_plan_handler, enrollment_list_handler, get_student_handler,
    plan_list_handler, update_plan_handler, update_student_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /plans`              - List plans (paginated)
/// - `POST   /plans`              - Create a plan
/// - `PUT    /plans/{id}`         - Update a plan
/// - `DELETE /plans/{id}`         - Delete an unreferenced plan
/// - `POST   /students`           - Register a student
/// - `GET    /students/{id}`      - Fetch a student
/// - `PUT    /students/{id}`      - Update a student
/// - `GET    /enrollments`        - List enrollments (paginated)
/// - `POST   /enrollments`        - Enroll a student in a plan
/// - `DELETE /enrollments/{id}`   - Cancel an enrollment
///
/// Mutations additionally require an administrator principal.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(plan_list_handler).post(create_plan_handler))
        .route(
            "/plans/{id}",
            put(update_plan_handler).delete(delete_plan_handler),
        )
        .route("/students", post(create_student_handler))
        .route(
            "/students/{id}",
            get(get_student_handler).put(update_student_handler),
        )
        .route(
            "/enrollments",
            get(enrollment_list_handler).post(create_enrollment_handler),
        )
        .route("/enrollments/{id}", delete(cancel_enrollment_handler))
}
