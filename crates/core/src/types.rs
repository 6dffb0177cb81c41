/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts in whole currency units (KES by default).
pub type Amount = i64;

/// Currency recorded on payments when the caller does not name one.
pub const DEFAULT_CURRENCY: &str = "KES";
