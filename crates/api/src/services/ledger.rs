//! Bulk running-hours recording.
//!
//! One submission covers a whole vessel for one date. Records are processed
//! independently: a rejected record lands in the outcome's error list and
//! never blocks the valid records around it. Each accepted record triggers
//! a forward recompute of cumulative totals (backfills shift every later
//! day) and refreshes the equipment projection, all in one transaction per
//! record, then the plans attached to the touched equipment are swept.

use chrono::Utc;
use keelson_core::error::CoreError;
use keelson_core::hierarchy::derive_status;
use keelson_core::ledger::{
    exceeds_daily_policy, recompute_totals, validate_daily_hours, DailyEntry,
};
use keelson_core::plan::LeadWindow;
use keelson_core::types::DbId;
use keelson_db::models::equipment::Equipment;
use keelson_db::models::running_hours::{
    BulkOutcome, BulkRecordEntry, BulkRecordError, BulkRecordRequest,
};
use keelson_db::repositories::{EquipmentRepo, RunningHoursRepo, VesselRepo};
use keelson_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::services::notify::Notifier;
use crate::services::scheduler;

/// Record a bulk daily submission for one vessel.
///
/// Fails the whole request only for request-level problems (unknown vessel,
/// future date); per-record problems are collected in the outcome.
pub async fn record_bulk(
    pool: &DbPool,
    request: &BulkRecordRequest,
    recorded_by: Option<DbId>,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<BulkOutcome> {
    if !VesselRepo::exists(pool, request.vessel_id).await? {
        return Err(AppError::Core(CoreError::Referential {
            entity: "vessel",
            id: request.vessel_id,
        }));
    }

    let today = Utc::now().date_naive();
    if request.recorded_date > today {
        return Err(AppError::Core(CoreError::Validation(format!(
            "recorded_date {} is in the future",
            request.recorded_date
        ))));
    }

    let mut outcome = BulkOutcome::default();
    let mut touched = Vec::new();

    for entry in &request.records {
        match record_one(pool, request, entry, recorded_by).await {
            Ok(()) => {
                outcome.recorded += 1;
                touched.push(entry.equipment_id);
            }
            Err(RecordFailure::Rejected(reason)) => {
                outcome.errors.push(BulkRecordError {
                    equipment_id: entry.equipment_id,
                    reason,
                });
            }
            Err(RecordFailure::Infrastructure(e)) => return Err(e),
        }
    }

    // The ledger moved; plans on the touched equipment may have entered
    // their lead window.
    let summary = scheduler::sweep_equipment(pool, &touched, Utc::now(), lead, notifier).await?;
    if summary.orders_created > 0 || summary.orders_refreshed > 0 {
        tracing::info!(
            created = summary.orders_created,
            refreshed = summary.orders_refreshed,
            "Post-recording sweep materialized work orders"
        );
    }

    Ok(outcome)
}

/// Why one record did not land.
enum RecordFailure {
    /// Record-specific, reported in the outcome; other records proceed.
    Rejected(String),
    /// Environment-level (database down), aborts the whole request.
    Infrastructure(AppError),
}

impl From<sqlx::Error> for RecordFailure {
    fn from(e: sqlx::Error) -> Self {
        Self::Infrastructure(e.into())
    }
}

async fn record_one(
    pool: &DbPool,
    request: &BulkRecordRequest,
    entry: &BulkRecordEntry,
    recorded_by: Option<DbId>,
) -> Result<(), RecordFailure> {
    if let Err(e) = validate_daily_hours(entry.daily_hours) {
        return Err(RecordFailure::Rejected(e.to_string()));
    }
    if exceeds_daily_policy(entry.daily_hours) {
        tracing::warn!(
            equipment_id = %entry.equipment_id,
            daily_hours = entry.daily_hours,
            "Daily hours exceed 24; accepting as a batched entry"
        );
    }

    let equipment = match EquipmentRepo::get(pool, entry.equipment_id).await? {
        Some(e) if e.is_active && e.vessel_id == request.vessel_id => e,
        _ => {
            return Err(RecordFailure::Rejected(format!(
                "equipment {} not found on vessel {}",
                entry.equipment_id, request.vessel_id
            )));
        }
    };

    // The upsert and the forward recompute it forces must land together;
    // a partial write would leave later totals out of step with the
    // cumulative rule.
    let mut tx = pool.begin().await?;

    // Cumulative baseline: the last total before this date, or the
    // commissioning reading when this is the earliest record.
    let baseline = RunningHoursRepo::last_before(&mut *tx, equipment.id, request.recorded_date)
        .await?
        .map(|r| r.total_hours)
        .unwrap_or(equipment.initial_running_hours);

    RunningHoursRepo::upsert(
        &mut *tx,
        equipment.id,
        request.recorded_date,
        entry.daily_hours,
        baseline + entry.daily_hours,
        recorded_by,
        entry.note.as_deref(),
    )
    .await?;

    recompute_forward(&mut tx, &equipment, request.recorded_date, baseline).await?;

    tx.commit().await?;
    Ok(())
}

/// Recompute cumulative totals from `from_date` onward and refresh the
/// equipment's materialized hours and status, inside the caller's
/// transaction.
async fn recompute_forward(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    equipment: &Equipment,
    from_date: chrono::NaiveDate,
    baseline: f64,
) -> Result<(), sqlx::Error> {
    let rows = RunningHoursRepo::list_from_date(&mut **tx, equipment.id, from_date).await?;
    let entries: Vec<DailyEntry> = rows
        .iter()
        .map(|r| DailyEntry {
            recorded_date: r.recorded_date,
            daily_hours: r.daily_hours,
        })
        .collect();

    let totals = recompute_totals(baseline, &entries);
    for (row, total) in rows.iter().zip(&totals) {
        if (row.total_hours - total).abs() > f64::EPSILON {
            RunningHoursRepo::set_total(&mut **tx, row.id, *total).await?;
        }
    }

    let current = totals.last().copied().unwrap_or(baseline);
    let status = derive_status(current, equipment.overhaul_interval_hours);
    EquipmentRepo::set_hours_and_status(&mut **tx, equipment.id, current, status.as_str()).await?;

    Ok(())
}
