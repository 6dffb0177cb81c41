use reelworks_core::project::Package;
use reelworks_core::types::{Amount, DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// A row from the `service_packages` table.
#[derive(Debug, Clone, FromRow)]
pub struct PackageRow {
    pub id: DbId,
    pub name: String,
    pub price: Amount,
    pub delivery_days: i32,
    pub revision_count: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a service package.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackage {
    pub name: String,
    pub price: Amount,
    pub delivery_days: i32,
    pub revision_count: i32,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            name: row.name,
            price: row.price,
            delivery_days: row.delivery_days,
            revision_count: row.revision_count,
            is_active: row.is_active,
        }
    }
}
