use reelworks_core::error::CoreError;
use reelworks_core::types::DbId;

/// lock_not_available, serialization_failure, deadlock_detected.
const CONTENTION_CODES: [&str; 3] = ["55P03", "40001", "40P01"];
const UNIQUE_VIOLATION: &str = "23505";

/// Translate a driver error into the domain taxonomy.
///
/// Lock and serialization failures become [`CoreError::Contention`] when the
/// error happened while working on `project_id`, so the workflow may retry.
pub(crate) fn classify(err: sqlx::Error, project_id: Option<DbId>) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        let code = code.as_deref();
        if let (Some(project_id), Some(code)) = (project_id, code) {
            if CONTENTION_CODES.contains(&code) {
                tracing::warn!(project_id, code, "Database contention");
                return CoreError::Contention { project_id };
            }
        }
        if code == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return CoreError::Conflict(format!("Duplicate value violates {constraint}"));
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(format!("Database error: {err}"))
}

/// Shorthand for errors outside any project lock.
pub(crate) fn internal(err: sqlx::Error) -> CoreError {
    classify(err, None)
}
