use reelworks_core::error::CoreError;
use reelworks_core::project::{Project, ProjectIntake};
use reelworks_core::status::{ProjectStatus, StatusId};
use reelworks_core::types::{Amount, DbId, Timestamp};
use sqlx::FromRow;

use super::{decode_name, decode_status};

/// A row from the `projects` table. Intake fields are stored flat.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub client_id: DbId,
    pub package_id: DbId,
    pub assigned_to: Option<DbId>,
    pub status_id: StatusId,
    pub title: String,
    pub description: String,
    pub target_platform: String,
    pub video_duration: String,
    pub script_provided: bool,
    pub custom_script: Option<String>,
    pub brand_colors: Vec<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
    pub client_notes: Option<String>,
    pub priority: String,
    pub total_amount: Amount,
    pub revision_count_used: i32,
    pub max_revisions: i32,
    pub delivery_days: i32,
    pub deadline_date: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = CoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            client_id: row.client_id,
            package_id: row.package_id,
            assigned_to: row.assigned_to,
            status: decode_status("project status", row.status_id, ProjectStatus::from_id)?,
            intake: ProjectIntake {
                title: row.title,
                description: row.description,
                target_platform: decode_name("target_platform", &row.target_platform)?,
                video_duration: decode_name("video_duration", &row.video_duration)?,
                script_provided: row.script_provided,
                custom_script: row.custom_script,
                brand_colors: row.brand_colors,
                cta_text: row.cta_text,
                cta_url: row.cta_url,
                client_notes: row.client_notes,
                priority: decode_name("priority", &row.priority)?,
            },
            total_amount: row.total_amount,
            revision_count_used: row.revision_count_used,
            max_revisions: row.max_revisions,
            delivery_days: row.delivery_days,
            deadline_date: row.deadline_date,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
