//! Application error type shared by services, repositories and HTTP handlers.
//!
//! Every variant maps to a fixed HTTP status and a stable `code` string so that
//! clients can branch on the error kind without parsing message text.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload used in JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Kind of record a [`AppError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Student,
    Plan,
    Enrollment,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Student => "Student",
            Resource::Plan => "Plan",
            Resource::Enrollment => "Enrollment",
            Resource::User => "User",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input.
    Validation { message: String, details: Value },
    /// Start date resolves to an instant before now.
    InvalidDate { message: String, details: Value },
    /// Missing or invalid API credentials.
    Unauthenticated { message: String, details: Value },
    /// Authenticated principal lacks administrator capability.
    Unauthorized { message: String, details: Value },
    NotFound {
        resource: Resource,
        message: String,
        details: Value,
    },
    AlreadyCancelled { message: String, details: Value },
    Conflict { message: String, details: Value },
    /// The notification job could not be durably accepted.
    QueueUnavailable { message: String, details: Value },
    /// The caller's deadline elapsed before the workflow completed.
    Cancelled { message: String, details: Value },
    /// A repository write failed.
    Persistence { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_date(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidDate {
            message: message.into(),
            details,
        }
    }

    pub fn unauthenticated(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthenticated {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(resource: Resource, details: Value) -> Self {
        Self::NotFound {
            resource,
            message: format!("{resource} not found"),
            details,
        }
    }

    pub fn already_cancelled(details: Value) -> Self {
        Self::AlreadyCancelled {
            message: "Enrollment is already cancelled".to_string(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn queue_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::QueueUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn cancelled(details: Value) -> Self {
        Self::Cancelled {
            message: "Deadline elapsed before the operation completed".to_string(),
            details,
        }
    }

    pub fn persistence(message: impl Into<String>, details: Value) -> Self {
        Self::Persistence {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status for this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidDate { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyCancelled { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::QueueUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Persistence { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::InvalidDate { .. } => "invalid_date",
            AppError::Unauthenticated { .. } => "unauthenticated",
            AppError::Unauthorized { .. } => "forbidden",
            AppError::NotFound { .. } => "not_found",
            AppError::AlreadyCancelled { .. } => "already_cancelled",
            AppError::Conflict { .. } => "conflict",
            AppError::QueueUnavailable { .. } => "queue_unavailable",
            AppError::Cancelled { .. } => "cancelled",
            AppError::Persistence { .. } => "persistence_failure",
            AppError::Internal { .. } => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::InvalidDate { message, .. }
            | AppError::Unauthenticated { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::AlreadyCancelled { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::QueueUnavailable { message, .. }
            | AppError::Cancelled { message, .. }
            | AppError::Persistence { message, .. }
            | AppError::Internal { message, .. } => message,
        }
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(self) -> ErrorInfo {
        let code = self.code();
        let (message, details) = match self {
            AppError::NotFound {
                resource,
                message,
                details,
            } => {
                let mut details = details;
                if let Value::Object(ref mut map) = details {
                    map.insert("resource".to_string(), json!(resource));
                } else {
                    details = json!({ "resource": resource });
                }
                (message, details)
            }
            AppError::Validation { message, details }
            | AppError::InvalidDate { message, details }
            | AppError::Unauthenticated { message, details }
            | AppError::Unauthorized { message, details }
            | AppError::AlreadyCancelled { message, details }
            | AppError::Conflict { message, details }
            | AppError::QueueUnavailable { message, details }
            | AppError::Cancelled { message, details }
            | AppError::Persistence { message, details }
            | AppError::Internal { message, details } => (message, details),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_error_info(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
            if db.is_foreign_key_violation() {
                return AppError::conflict(
                    "Record is still referenced",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error", json!({}))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(
            "Invalid request body",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: serde_json::Map<String, Value> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), json!(reasons))
            })
            .collect();

        AppError::bad_request("Validation failed", json!({ "fields": fields }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::invalid_date("x", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized("x", json!({})).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found(Resource::Plan, json!({})).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::already_cancelled(json!({})).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::queue_unavailable("x", json!({})).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AppError::bad_request("x", json!({})),
            AppError::invalid_date("x", json!({})),
            AppError::unauthenticated("x", json!({})),
            AppError::unauthorized("x", json!({})),
            AppError::not_found(Resource::Student, json!({})),
            AppError::already_cancelled(json!({})),
            AppError::conflict("x", json!({})),
            AppError::queue_unavailable("x", json!({})),
            AppError::cancelled(json!({})),
            AppError::persistence("x", json!({})),
            AppError::internal("x", json!({})),
        ];

        let mut codes: Vec<&str> = errors.iter().map(AppError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_not_found_carries_resource() {
        let info = AppError::not_found(Resource::Enrollment, json!({ "id": 7 })).to_error_info();

        assert_eq!(info.code, "not_found");
        assert_eq!(info.message, "Enrollment not found");
        assert_eq!(info.details["resource"], "enrollment");
        assert_eq!(info.details["id"], 7);
    }
}
