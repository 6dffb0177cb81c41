use reelworks_core::error::CoreError;
use reelworks_core::roles::Identity;
use reelworks_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

use super::decode_name;

/// A row from the `identities` table.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRow {
    pub id: DbId,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for mirroring an identity from the auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIdentity {
    pub display_name: String,
    pub role: String,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = CoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id,
            display_name: row.display_name,
            role: decode_name("role", &row.role)?,
            is_active: row.is_active,
        })
    }
}
