//! Repository for the `identities` table.

use reelworks_core::types::DbId;
use sqlx::PgPool;

use crate::models::identity::{CreateIdentity, IdentityRow};

const COLUMNS: &str = "id, display_name, role, is_active, created_at";

pub struct IdentityRepo;

impl IdentityRepo {
    pub async fn create(pool: &PgPool, input: &CreateIdentity) -> Result<IdentityRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO identities (display_name, role) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IdentityRow>(&query)
            .bind(&input.display_name)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<IdentityRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM identities WHERE id = $1");
        sqlx::query_as::<_, IdentityRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a row was updated.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE identities SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
