//! Repository for the `maintenance_plans` table.

use keelson_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::maintenance_plan::{
    CreateMaintenancePlan, MaintenancePlan, UpdateMaintenancePlan,
};

/// Column list for `maintenance_plans` queries.
const COLUMNS: &str = "\
    id, equipment_id, vessel_id, title, description, \
    interval_unit, interval_value, priority, is_class_related, \
    estimated_hours, last_done_date, last_done_hours, \
    next_due_date, next_due_hours, is_active, created_at, updated_at";

/// Provides CRUD operations for maintenance plans.
pub struct MaintenancePlanRepo;

impl MaintenancePlanRepo {
    /// List active plans, optionally scoped to a vessel and/or equipment,
    /// nearest due first.
    pub async fn list(
        pool: &PgPool,
        vessel_id: Option<DbId>,
        equipment_id: Option<DbId>,
    ) -> Result<Vec<MaintenancePlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_plans \
             WHERE is_active \
               AND ($1::uuid IS NULL OR vessel_id = $1) \
               AND ($2::uuid IS NULL OR equipment_id = $2) \
             ORDER BY next_due_date ASC NULLS LAST, title ASC"
        );
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .bind(vessel_id)
            .bind(equipment_id)
            .fetch_all(pool)
            .await
    }

    /// Every active plan in the fleet, for the periodic sweep.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<MaintenancePlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maintenance_plans WHERE is_active");
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .fetch_all(pool)
            .await
    }

    /// Active plans tied to any of the given equipment, for the
    /// post-ledger-update sweep.
    pub async fn list_active_for_equipment(
        pool: &PgPool,
        equipment_ids: &[DbId],
    ) -> Result<Vec<MaintenancePlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM maintenance_plans \
             WHERE is_active AND equipment_id = ANY($1)"
        );
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .bind(equipment_ids)
            .fetch_all(pool)
            .await
    }

    /// Fetch one plan by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<MaintenancePlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maintenance_plans WHERE id = $1");
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a plan. The scheduler fills the next-due cache on its next
    /// pass over the equipment.
    pub async fn insert(
        pool: &PgPool,
        vessel_id: DbId,
        input: &CreateMaintenancePlan,
    ) -> Result<MaintenancePlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO maintenance_plans \
                 (equipment_id, vessel_id, title, description, \
                  interval_unit, interval_value, priority, is_class_related, \
                  estimated_hours, last_done_date, last_done_hours) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .bind(input.equipment_id)
            .bind(vessel_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.interval_unit)
            .bind(input.interval_value)
            .bind(input.priority.as_deref().unwrap_or("Medium"))
            .bind(input.is_class_related.unwrap_or(false))
            .bind(input.estimated_hours)
            .bind(input.last_done_date)
            .bind(input.last_done_hours)
            .fetch_one(pool)
            .await
    }

    /// Patch plan fields. Absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaintenancePlan,
    ) -> Result<Option<MaintenancePlan>, sqlx::Error> {
        let query = format!(
            "UPDATE maintenance_plans SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 interval_unit = COALESCE($4, interval_unit), \
                 interval_value = COALESCE($5, interval_value), \
                 priority = COALESCE($6, priority), \
                 is_class_related = COALESCE($7, is_class_related), \
                 estimated_hours = COALESCE($8, estimated_hours), \
                 last_done_date = COALESCE($9, last_done_date), \
                 last_done_hours = COALESCE($10, last_done_hours), \
                 is_active = COALESCE($11, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MaintenancePlan>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.interval_unit)
            .bind(input.interval_value)
            .bind(&input.priority)
            .bind(input.is_class_related)
            .bind(input.estimated_hours)
            .bind(input.last_done_date)
            .bind(input.last_done_hours)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Refresh the derived next-due cache.
    pub async fn set_next_due(
        pool: &PgPool,
        id: DbId,
        next_due_date: Option<Timestamp>,
        next_due_hours: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE maintenance_plans \
             SET next_due_date = $2, next_due_hours = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_due_date)
        .bind(next_due_hours)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Advance the anchor after a linked work order completes.
    pub async fn set_last_done(
        pool: &PgPool,
        id: DbId,
        last_done_date: Timestamp,
        last_done_hours: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE maintenance_plans \
             SET last_done_date = $2, \
                 last_done_hours = COALESCE($3, last_done_hours), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(last_done_date)
        .bind(last_done_hours)
        .execute(pool)
        .await?;
        Ok(())
    }
}
