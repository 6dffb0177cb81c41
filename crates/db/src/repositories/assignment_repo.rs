//! Repository for the `assignments` table.

use reelworks_core::assignment::NewAssignment;
use reelworks_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::assignment::AssignmentRow;

const COLUMNS: &str =
    "id, project_id, editor_id, assigned_by, is_active, assigned_at, superseded_at";

pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Mark the active assignment of a project inactive. Returns rows touched.
    pub async fn supersede_active(
        conn: &mut PgConnection,
        project_id: DbId,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assignments SET is_active = FALSE, superseded_at = $2
             WHERE project_id = $1 AND is_active",
        )
        .bind(project_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn create(
        conn: &mut PgConnection,
        input: &NewAssignment,
    ) -> Result<AssignmentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO assignments (project_id, editor_id, assigned_by, is_active, assigned_at)
             VALUES ($1, $2, $3, TRUE, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(input.project_id)
            .bind(input.editor_id)
            .bind(input.assigned_by)
            .bind(input.assigned_at)
            .fetch_one(conn)
            .await
    }

    /// Full history, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assignments WHERE project_id = $1 ORDER BY assigned_at, id"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
