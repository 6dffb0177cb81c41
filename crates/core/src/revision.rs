//! Revision requests and the per-project revision budget.
//!
//! A project carries at most one unresolved revision at a time. A revision
//! is immutable once `resolved_at` is set.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{ProjectStatus, RevisionStatus};
use crate::types::{DbId, Timestamp};

/// Maximum length of a revision request description.
pub const MAX_REVISION_DESCRIPTION_LENGTH: usize = 5_000;

/// Description recorded when a revision is opened through a bare status change.
pub const DEFAULT_REVISION_DESCRIPTION: &str = "Revision requested";

/// A client-initiated request for rework against a delivered draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: DbId,
    pub project_id: DbId,
    pub revision_number: i32,
    pub requested_by: DbId,
    pub description: String,
    pub status: RevisionStatus,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Revision {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Insert payload for a new revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRevision {
    pub project_id: DbId,
    pub revision_number: i32,
    pub requested_by: DbId,
    pub description: String,
    pub created_at: Timestamp,
}

impl NewRevision {
    pub fn into_revision(self, id: DbId) -> Revision {
        Revision {
            id,
            project_id: self.project_id,
            revision_number: self.revision_number,
            requested_by: self.requested_by,
            description: self.description,
            status: RevisionStatus::InRevision,
            resolved_at: None,
            created_at: self.created_at,
        }
    }
}

/// Closing an open revision, either because the work was redone or because
/// the project was cancelled underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionResolution {
    pub revision_id: DbId,
    pub status: RevisionStatus,
    pub resolved_at: Timestamp,
}

pub fn validate_revision_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Revision description must not be empty".to_string(),
        ));
    }
    if description.len() > MAX_REVISION_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Revision description exceeds maximum length of {MAX_REVISION_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Fail when the budget is spent. Exceeding is rejected, never clamped.
pub fn check_revision_budget(used: i32, max: i32) -> Result<(), CoreError> {
    if used >= max {
        return Err(CoreError::RevisionBudgetExceeded { used, max });
    }
    Ok(())
}

/// Next 1-based revision number: one past the highest existing.
pub fn next_revision_number(existing: &[Revision]) -> i32 {
    existing
        .iter()
        .map(|r| r.revision_number)
        .max()
        .unwrap_or(0)
        + 1
}

/// The single unresolved revision, if any.
pub fn open_revision(existing: &[Revision]) -> Option<&Revision> {
    existing.iter().find(|r| r.is_open())
}

/// Everything that must hold before a new revision may be opened.
///
/// Checked in order: project status, budget, no other open revision.
pub fn check_can_open_revision(
    status: ProjectStatus,
    used: i32,
    max: i32,
    existing: &[Revision],
) -> Result<(), CoreError> {
    if status != ProjectStatus::AwaitingApproval {
        return Err(CoreError::invalid_transition(
            status,
            ProjectStatus::InRevision,
            "revisions can only be requested while awaiting approval",
        ));
    }
    check_revision_budget(used, max)?;
    if let Some(open) = open_revision(existing) {
        return Err(CoreError::invalid_transition(
            status,
            ProjectStatus::InRevision,
            format!("revision #{} is still unresolved", open.revision_number),
        ));
    }
    Ok(())
}
