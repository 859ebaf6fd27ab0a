//! Running-hours ledger models and bulk-record DTOs.

use chrono::NaiveDate;
use keelson_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `running_hours` table. One row per equipment per date.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunningHoursRecord {
    pub id: DbId,
    pub equipment_id: DbId,
    pub recorded_date: NaiveDate,
    pub daily_hours: f64,
    /// Cumulative snapshot as of `recorded_date`.
    pub total_hours: f64,
    pub recorded_by: Option<DbId>,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// One entry in a bulk daily submission.
#[derive(Debug, Deserialize)]
pub struct BulkRecordEntry {
    pub equipment_id: DbId,
    pub daily_hours: f64,
    pub note: Option<String>,
}

/// DTO for `POST /running-hours/record/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkRecordRequest {
    pub vessel_id: DbId,
    pub recorded_date: NaiveDate,
    pub records: Vec<BulkRecordEntry>,
}

/// A rejected entry from a bulk submission. Rejections never block the
/// valid entries submitted alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkRecordError {
    pub equipment_id: DbId,
    pub reason: String,
}

/// Result of a bulk submission: partial success is the norm.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub recorded: u64,
    pub errors: Vec<BulkRecordError>,
}

/// Latest-hours row per equipment for the vessel dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LatestHoursRow {
    pub equipment_id: DbId,
    pub equipment_code: String,
    pub equipment_name: String,
    pub category: String,
    pub total_hours: f64,
    pub last_recorded_date: Option<NaiveDate>,
    pub overhaul_interval_hours: Option<f64>,
    /// Filled in by the handler from core's gauge math.
    #[sqlx(skip)]
    pub percent_to_overhaul: Option<f64>,
}
