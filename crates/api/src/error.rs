use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use reelworks_core::error::CoreError;
use serde_json::json;

/// Seconds a client should wait before retrying a contended write.
const CONTENTION_RETRY_AFTER_SECS: u64 = 1;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Missing, malformed or expired credentials.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", core.to_string())
                }
                CoreError::InvalidState(msg) => {
                    (StatusCode::CONFLICT, "INVALID_STATE", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::RevisionBudgetExceeded { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "REVISION_BUDGET_EXCEEDED",
                    core.to_string(),
                ),
                CoreError::Contention { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONTENTION",
                    core.to_string(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, AppError::Core(CoreError::Contention { .. })) {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(CONTENTION_RETRY_AFTER_SECS),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelworks_core::status::ProjectStatus;

    fn status_of(err: CoreError) -> StatusCode {
        AppError::Core(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(CoreError::NotFound {
                entity: "project",
                id: 1
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::Unauthorized("no".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::InvalidTransition {
                from: ProjectStatus::Queued,
                to: ProjectStatus::Completed,
                reason: "no edge".into(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::RevisionBudgetExceeded { used: 2, max: 2 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn contention_sets_retry_after() {
        let response = AppError::Core(CoreError::Contention { project_id: 4 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn bad_token_is_401() {
        let response = AppError::Unauthenticated("expired".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
