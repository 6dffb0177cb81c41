use crate::status::ProjectStatus;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid transition from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: ProjectStatus,
        to: ProjectStatus,
        reason: String,
    },

    #[error("Revision budget exceeded: {used} of {max} revisions already used")]
    RevisionBudgetExceeded { used: i32, max: i32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Contention on project {project_id}, retry later")]
    Contention { project_id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Only lock/transaction conflicts are safe to retry blindly.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Contention { .. })
    }

    pub(crate) fn invalid_transition(
        from: ProjectStatus,
        to: ProjectStatus,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidTransition {
            from,
            to,
            reason: reason.into(),
        }
    }
}
