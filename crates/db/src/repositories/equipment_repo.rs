//! Repository for the `equipment` table.
//!
//! Hierarchy validation (cycles, reparenting) happens in `keelson-core`
//! before any write lands here; running hours and derived status are only
//! written through [`EquipmentRepo::set_hours_and_status`], which the
//! ledger service owns.

use keelson_core::types::DbId;
use sqlx::PgPool;

use crate::models::equipment::{CreateEquipment, Equipment, UpdateEquipment};

/// Column list for `equipment` queries.
const COLUMNS: &str = "\
    id, vessel_id, parent_id, equipment_code, name, category, \
    maker, model, serial_number, \
    initial_running_hours, current_running_hours, overhaul_interval_hours, \
    status, sort_order, is_active, created_at, updated_at";

/// Provides CRUD operations for the equipment hierarchy.
pub struct EquipmentRepo;

impl EquipmentRepo {
    /// List a vessel's active equipment, optionally filtered by category,
    /// in tree display order.
    pub async fn list_by_vessel(
        pool: &PgPool,
        vessel_id: DbId,
        category: Option<&str>,
    ) -> Result<Vec<Equipment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment \
             WHERE vessel_id = $1 AND is_active \
               AND ($2::text IS NULL OR category = $2) \
             ORDER BY sort_order ASC, name ASC"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(vessel_id)
            .bind(category)
            .fetch_all(pool)
            .await
    }

    /// Fetch one equipment row by id (active or not; callers decide).
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE id = $1");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Register new equipment. `current_running_hours` starts at the
    /// initial reading; duplicate codes per vessel hit
    /// `uq_equipment_code_per_vessel`.
    pub async fn insert(pool: &PgPool, input: &CreateEquipment) -> Result<Equipment, sqlx::Error> {
        let initial = input.initial_running_hours.unwrap_or(0.0);
        let query = format!(
            "INSERT INTO equipment \
                 (vessel_id, parent_id, equipment_code, name, category, \
                  maker, model, serial_number, \
                  initial_running_hours, current_running_hours, \
                  overhaul_interval_hours, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(input.vessel_id)
            .bind(input.parent_id)
            .bind(&input.equipment_code)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.maker)
            .bind(&input.model)
            .bind(&input.serial_number)
            .bind(initial)
            .bind(input.overhaul_interval_hours)
            .bind(input.sort_order.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// Patch static fields. Absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEquipment,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!(
            "UPDATE equipment SET \
                 parent_id = COALESCE($2, parent_id), \
                 equipment_code = COALESCE($3, equipment_code), \
                 name = COALESCE($4, name), \
                 category = COALESCE($5, category), \
                 maker = COALESCE($6, maker), \
                 model = COALESCE($7, model), \
                 serial_number = COALESCE($8, serial_number), \
                 overhaul_interval_hours = COALESCE($9, overhaul_interval_hours), \
                 sort_order = COALESCE($10, sort_order), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .bind(input.parent_id)
            .bind(&input.equipment_code)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.maker)
            .bind(&input.model)
            .bind(&input.serial_number)
            .bind(input.overhaul_interval_hours)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a set of equipment ids (a node plus its subtree).
    /// Returns the number of rows deactivated.
    pub async fn deactivate_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE equipment SET is_active = FALSE, updated_at = NOW() \
             WHERE id = ANY($1) AND is_active",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Materialize the ledger-derived projection: cumulative hours and the
    /// derived status. Takes an executor so the ledger service can commit
    /// it with the recompute it belongs to.
    pub async fn set_hours_and_status(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
        current_running_hours: f64,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE equipment \
             SET current_running_hours = $2, status = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(current_running_hours)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }
}
