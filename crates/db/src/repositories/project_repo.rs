//! Repository for the `projects` table.

use reelworks_core::project::{NewProject, Project};
use reelworks_core::status::ProjectStatus;
use reelworks_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::project::ProjectRow;

/// Column list for projects queries.
const COLUMNS: &str = "id, client_id, package_id, assigned_to, status_id, \
    title, description, target_platform, video_duration, script_provided, custom_script, \
    brand_colors, cta_text, cta_url, client_notes, priority, \
    total_amount, revision_count_used, max_revisions, delivery_days, \
    deadline_date, started_at, completed_at, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in `pending_payment`, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (client_id, package_id, status_id, title, description, target_platform,
                 video_duration, script_provided, custom_script, brand_colors, cta_text,
                 cta_url, client_notes, priority, total_amount, max_revisions, delivery_days,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                     $18, $18)
             RETURNING {COLUMNS}"
        );
        let intake = &input.intake;
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(input.client_id)
            .bind(input.package_id)
            .bind(ProjectStatus::PendingPayment.id())
            .bind(&intake.title)
            .bind(&intake.description)
            .bind(intake.target_platform.as_str())
            .bind(intake.video_duration.as_str())
            .bind(intake.script_provided)
            .bind(&intake.custom_script)
            .bind(&intake.brand_colors)
            .bind(&intake.cta_text)
            .bind(&intake.cta_url)
            .bind(&intake.client_notes)
            .bind(intake.priority.as_str())
            .bind(input.total_amount)
            .bind(input.max_revisions)
            .bind(input.delivery_days)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read the row and hold its lock until the surrounding transaction ends.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write every mutable column of `project`.
    pub async fn update(
        conn: &mut PgConnection,
        project: &Project,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                assigned_to = $2,
                status_id = $3,
                revision_count_used = $4,
                deadline_date = $5,
                started_at = $6,
                completed_at = $7,
                updated_at = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(project.id)
            .bind(project.assigned_to)
            .bind(project.status.id())
            .bind(project.revision_count_used)
            .bind(project.deadline_date)
            .bind(project.started_at)
            .bind(project.completed_at)
            .bind(project.updated_at)
            .fetch_one(conn)
            .await
    }

    /// List projects, optionally narrowed by owner and assignee, ordered by id.
    pub async fn list(
        pool: &PgPool,
        client_id: Option<DbId>,
        assigned_to: Option<DbId>,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::BIGINT IS NULL OR client_id = $1)
               AND ($2::BIGINT IS NULL OR assigned_to = $2)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(client_id)
            .bind(assigned_to)
            .fetch_all(pool)
            .await
    }
}
