//! Editor-to-project assignment facts.
//!
//! Reassignment is the only mutation: a new assignment supersedes the
//! active one, which stays in the history marked inactive.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::Project;
use crate::roles::{Identity, Role};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: DbId,
    pub project_id: DbId,
    pub editor_id: DbId,
    pub assigned_by: DbId,
    pub is_active: bool,
    pub assigned_at: Timestamp,
    pub superseded_at: Option<Timestamp>,
}

/// Insert payload for a new active assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub project_id: DbId,
    pub editor_id: DbId,
    pub assigned_by: DbId,
    pub assigned_at: Timestamp,
}

impl NewAssignment {
    pub fn into_assignment(self, id: DbId) -> Assignment {
        Assignment {
            id,
            project_id: self.project_id,
            editor_id: self.editor_id,
            assigned_by: self.assigned_by,
            is_active: true,
            assigned_at: self.assigned_at,
            superseded_at: None,
        }
    }
}

/// The assignment currently in force, if any.
pub fn active_assignment(history: &[Assignment]) -> Option<&Assignment> {
    history.iter().rev().find(|a| a.is_active)
}

/// Check that `editor` may take over `project`.
pub fn check_assignable(project: &Project, editor: &Identity) -> Result<(), CoreError> {
    if project.status.is_terminal() {
        return Err(CoreError::InvalidState(format!(
            "Project {} is {} and can no longer be assigned",
            project.id, project.status
        )));
    }
    if editor.role != Role::Editor {
        return Err(CoreError::Validation(format!(
            "Identity {} has role '{}'; only editors can be assigned",
            editor.id, editor.role
        )));
    }
    if !editor.is_active {
        return Err(CoreError::Validation(format!(
            "Editor {} is deactivated",
            editor.id
        )));
    }
    Ok(())
}
