//! Row types for every table, with conversions into the domain types.

pub mod assignment;
pub mod identity;
pub mod notification;
pub mod package;
pub mod payment;
pub mod project;
pub mod revision;

use std::str::FromStr;

use reelworks_core::error::CoreError;
use reelworks_core::status::StatusId;

/// Parse a text enum column. A bad value means the row was written outside
/// the application.
pub(crate) fn decode_name<T>(column: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    raw.parse()
        .map_err(|err| CoreError::Internal(format!("Unreadable {column} '{raw}': {err}")))
}

/// Resolve a SMALLINT status column.
pub(crate) fn decode_status<T>(
    column: &str,
    id: StatusId,
    from_id: fn(StatusId) -> Option<T>,
) -> Result<T, CoreError> {
    from_id(id).ok_or_else(|| CoreError::Internal(format!("Unknown {column} id {id}")))
}
