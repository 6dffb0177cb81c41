//! Repository for the `revisions` table.

use reelworks_core::revision::{NewRevision, RevisionResolution};
use reelworks_core::status::RevisionStatus;
use reelworks_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::revision::RevisionRow;

const COLUMNS: &str = "id, project_id, revision_number, requested_by, description, \
    status_id, resolved_at, created_at";

pub struct RevisionRepo;

impl RevisionRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewRevision,
    ) -> Result<RevisionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO revisions
                (project_id, revision_number, requested_by, description, status_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RevisionRow>(&query)
            .bind(input.project_id)
            .bind(input.revision_number)
            .bind(input.requested_by)
            .bind(&input.description)
            .bind(RevisionStatus::InRevision.id())
            .bind(input.created_at)
            .fetch_one(conn)
            .await
    }

    /// Close a revision that is still open. Returns `None` if it is not
    /// open or belongs to another project.
    pub async fn resolve(
        conn: &mut PgConnection,
        project_id: DbId,
        resolution: &RevisionResolution,
    ) -> Result<Option<RevisionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE revisions SET status_id = $3, resolved_at = $4
             WHERE id = $1 AND project_id = $2 AND resolved_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RevisionRow>(&query)
            .bind(resolution.revision_id)
            .bind(project_id)
            .bind(resolution.status.id())
            .bind(resolution.resolved_at)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RevisionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM revisions WHERE id = $1");
        sqlx::query_as::<_, RevisionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All revisions of a project, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<RevisionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM revisions WHERE project_id = $1 ORDER BY revision_number ASC"
        );
        sqlx::query_as::<_, RevisionRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
