use reelworks_core::assignment::Assignment;
use reelworks_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `assignments` table.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: DbId,
    pub project_id: DbId,
    pub editor_id: DbId,
    pub assigned_by: DbId,
    pub is_active: bool,
    pub assigned_at: Timestamp,
    pub superseded_at: Option<Timestamp>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            project_id: row.project_id,
            editor_id: row.editor_id,
            assigned_by: row.assigned_by,
            is_active: row.is_active,
            assigned_at: row.assigned_at,
            superseded_at: row.superseded_at,
        }
    }
}
