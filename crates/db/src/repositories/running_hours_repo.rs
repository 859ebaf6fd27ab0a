//! Repository for the `running_hours` ledger table.
//!
//! Rows are append/overwrite only, keyed on `(equipment_id, recorded_date)`
//! via `uq_running_hours_equipment_date`. Cumulative totals are computed by
//! the ledger service; this layer only moves rows.
//!
//! The write-path methods take `impl PgExecutor` so the ledger service can
//! run an upsert and its forward recompute inside one transaction.

use chrono::NaiveDate;
use keelson_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::running_hours::{LatestHoursRow, RunningHoursRecord};

/// Column list for `running_hours` queries.
const COLUMNS: &str = "\
    id, equipment_id, recorded_date, daily_hours, total_hours, \
    recorded_by, note, created_at";

/// Ledger row access.
pub struct RunningHoursRepo;

impl RunningHoursRepo {
    /// Insert or overwrite the record for one equipment/date.
    ///
    /// Overwrites replace `daily_hours` and `total_hours` for that date;
    /// downstream totals are fixed up by
    /// [`RunningHoursRepo::list_from_date`] + [`RunningHoursRepo::set_total`].
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        equipment_id: DbId,
        recorded_date: NaiveDate,
        daily_hours: f64,
        total_hours: f64,
        recorded_by: Option<DbId>,
        note: Option<&str>,
    ) -> Result<RunningHoursRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO running_hours \
                 (equipment_id, recorded_date, daily_hours, total_hours, recorded_by, note) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_running_hours_equipment_date \
             DO UPDATE SET daily_hours = EXCLUDED.daily_hours, \
                           total_hours = EXCLUDED.total_hours, \
                           recorded_by = EXCLUDED.recorded_by, \
                           note = EXCLUDED.note \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunningHoursRecord>(&query)
            .bind(equipment_id)
            .bind(recorded_date)
            .bind(daily_hours)
            .bind(total_hours)
            .bind(recorded_by)
            .bind(note)
            .fetch_one(executor)
            .await
    }

    /// The latest record strictly before `date`, the cumulative baseline
    /// for recomputation.
    pub async fn last_before(
        executor: impl PgExecutor<'_>,
        equipment_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<RunningHoursRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM running_hours \
             WHERE equipment_id = $1 AND recorded_date < $2 \
             ORDER BY recorded_date DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, RunningHoursRecord>(&query)
            .bind(equipment_id)
            .bind(date)
            .fetch_optional(executor)
            .await
    }

    /// All records on or after `date`, ascending: the recompute run after a
    /// backfilled overwrite.
    pub async fn list_from_date(
        executor: impl PgExecutor<'_>,
        equipment_id: DbId,
        date: NaiveDate,
    ) -> Result<Vec<RunningHoursRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM running_hours \
             WHERE equipment_id = $1 AND recorded_date >= $2 \
             ORDER BY recorded_date ASC"
        );
        sqlx::query_as::<_, RunningHoursRecord>(&query)
            .bind(equipment_id)
            .bind(date)
            .fetch_all(executor)
            .await
    }

    /// Records inside `[start, end]`, ascending, for history windows.
    pub async fn list_window(
        pool: &PgPool,
        equipment_id: DbId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RunningHoursRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM running_hours \
             WHERE equipment_id = $1 AND recorded_date BETWEEN $2 AND $3 \
             ORDER BY recorded_date ASC"
        );
        sqlx::query_as::<_, RunningHoursRecord>(&query)
            .bind(equipment_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the cumulative snapshot of one row during recomputation.
    pub async fn set_total(
        executor: impl PgExecutor<'_>,
        id: DbId,
        total_hours: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE running_hours SET total_hours = $2 WHERE id = $1")
            .bind(id)
            .bind(total_hours)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// The most recent record for one equipment.
    pub async fn latest(
        pool: &PgPool,
        equipment_id: DbId,
    ) -> Result<Option<RunningHoursRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM running_hours \
             WHERE equipment_id = $1 \
             ORDER BY recorded_date DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, RunningHoursRecord>(&query)
            .bind(equipment_id)
            .fetch_optional(pool)
            .await
    }

    /// Per-equipment latest totals for one vessel's dashboard.
    pub async fn latest_for_vessel(
        pool: &PgPool,
        vessel_id: DbId,
    ) -> Result<Vec<LatestHoursRow>, sqlx::Error> {
        sqlx::query_as::<_, LatestHoursRow>(
            "SELECT e.id AS equipment_id, \
                    e.equipment_code, \
                    e.name AS equipment_name, \
                    e.category, \
                    e.current_running_hours AS total_hours, \
                    rh.recorded_date AS last_recorded_date, \
                    e.overhaul_interval_hours \
             FROM equipment e \
             LEFT JOIN LATERAL ( \
                 SELECT recorded_date FROM running_hours \
                 WHERE equipment_id = e.id \
                 ORDER BY recorded_date DESC \
                 LIMIT 1 \
             ) rh ON TRUE \
             WHERE e.vessel_id = $1 AND e.is_active \
             ORDER BY e.sort_order ASC, e.name ASC",
        )
        .bind(vessel_id)
        .fetch_all(pool)
        .await
    }
}
