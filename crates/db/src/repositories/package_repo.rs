//! Repository for the `service_packages` table.

use reelworks_core::types::DbId;
use sqlx::PgPool;

use crate::models::package::{CreatePackage, PackageRow};

const COLUMNS: &str = "id, name, price, delivery_days, revision_count, is_active, created_at";

pub struct PackageRepo;

impl PackageRepo {
    pub async fn create(pool: &PgPool, input: &CreatePackage) -> Result<PackageRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_packages (name, price, delivery_days, revision_count)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PackageRow>(&query)
            .bind(&input.name)
            .bind(input.price)
            .bind(input.delivery_days)
            .bind(input.revision_count)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PackageRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_packages WHERE id = $1");
        sqlx::query_as::<_, PackageRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Packages currently on offer, cheapest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<PackageRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_packages WHERE is_active ORDER BY price ASC"
        );
        sqlx::query_as::<_, PackageRow>(&query).fetch_all(pool).await
    }

    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE service_packages SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
