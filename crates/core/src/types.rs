/// Database primary key type (UUID, matching the `uuid` column type).
pub type DbId = uuid::Uuid;

/// Timestamp type used for all datetime columns (UTC).
pub type Timestamp = chrono::DateTime<chrono::Utc>;
