//! Mapping of database write failures onto [`AppError`].

use serde_json::json;

use crate::error::AppError;

/// Maps a failed write: constraint violations become conflicts, anything else
/// is a persistence failure.
pub fn map_write_error(e: sqlx::Error) -> AppError {
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

    tracing::error!(error = %e, "Database write failed");
    AppError::persistence("Database write failed", json!({}))
}

/// Maps a failed insert whose references were checked beforehand.
///
/// A foreign key violation here means a referenced row vanished mid-write, so
/// it is a persistence failure like any other, not a conflict.
pub fn map_insert_error(e: sqlx::Error) -> AppError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
    {
        tracing::error!(error = %e, "Insert referenced a missing row");
        return AppError::persistence(
            "Database write failed",
            json!({ "reason": "foreign key violation" }),
        );
    }

    map_write_error(e)
}

/// Returns `true` if the error is a unique violation on the given constraint.
pub fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_persistence_failure() {
        let err = map_write_error(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "persistence_failure");
    }

    #[test]
    fn test_insert_error_falls_back_to_persistence_failure() {
        let err = map_insert_error(sqlx::Error::PoolClosed);
        assert_eq!(err.code(), "persistence_failure");
    }

    #[test]
    fn test_unique_violation_check_ignores_other_errors() {
        assert!(!is_unique_violation_on(
            &sqlx::Error::RowNotFound,
            "students_email_key"
        ));
    }
}
