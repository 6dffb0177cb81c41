use reelworks_core::error::CoreError;
use reelworks_core::revision::Revision;
use reelworks_core::status::{RevisionStatus, StatusId};
use reelworks_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::decode_status;

/// A row from the `revisions` table.
#[derive(Debug, Clone, FromRow)]
pub struct RevisionRow {
    pub id: DbId,
    pub project_id: DbId,
    pub revision_number: i32,
    pub requested_by: DbId,
    pub description: String,
    pub status_id: StatusId,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<RevisionRow> for Revision {
    type Error = CoreError;

    fn try_from(row: RevisionRow) -> Result<Self, Self::Error> {
        Ok(Revision {
            id: row.id,
            project_id: row.project_id,
            revision_number: row.revision_number,
            requested_by: row.requested_by,
            description: row.description,
            status: decode_status("revision status", row.status_id, RevisionStatus::from_id)?,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
        })
    }
}
