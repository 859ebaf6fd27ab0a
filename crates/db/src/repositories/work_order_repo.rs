//! Repository for the `work_orders` table.
//!
//! Status writes go through [`WorkOrderRepo::transition`], a compare-and-set
//! on the expected current status. Lifecycle legality is decided in
//! `keelson-core` before the write; the CAS only guards against a
//! concurrent transition landing first.

use keelson_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::work_order::{CreateWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderSnapshotRow};

/// Column list for `work_orders` queries.
const COLUMNS: &str = "\
    id, plan_id, equipment_id, vessel_id, title, description, \
    status, priority, is_class_related, \
    planned_date, due_date, started_date, completed_date, \
    assigned_to, completed_by, actual_hours, running_hours_at_completion, \
    remarks, created_at, updated_at";

/// Completion fields applied by a transition.
#[derive(Debug, Default)]
pub struct TransitionWrite<'a> {
    pub started_date: Option<Timestamp>,
    pub completed_date: Option<Timestamp>,
    pub completed_by: Option<DbId>,
    pub actual_hours: Option<f64>,
    pub running_hours_at_completion: Option<f64>,
    pub remarks: Option<&'a str>,
}

/// Provides CRUD and lifecycle operations for work orders.
pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// List work orders matching the filter, soonest due first.
    pub async fn list(
        pool: &PgPool,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders \
             WHERE ($1::uuid IS NULL OR vessel_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::uuid IS NULL OR equipment_id = $3) \
             ORDER BY due_date ASC, created_at ASC"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(filter.vessel_id)
            .bind(&filter.status)
            .bind(filter.equipment_id)
            .fetch_all(pool)
            .await
    }

    /// Fetch one work order by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_orders WHERE id = $1");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a work order in `Planned`. Plan-linked inserts race against
    /// `uq_work_orders_active_plan`; the unique violation means another
    /// active order already covers the plan.
    pub async fn insert(
        pool: &PgPool,
        vessel_id: DbId,
        plan_id: Option<DbId>,
        input: &CreateWorkOrder,
    ) -> Result<WorkOrder, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_orders \
                 (plan_id, equipment_id, vessel_id, title, description, \
                  priority, is_class_related, planned_date, due_date, assigned_to) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(plan_id)
            .bind(input.equipment_id)
            .bind(vessel_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority.as_deref().unwrap_or("Medium"))
            .bind(input.is_class_related.unwrap_or(false))
            .bind(input.planned_date)
            .bind(input.due_date)
            .bind(input.assigned_to)
            .fetch_one(pool)
            .await
    }

    /// The non-terminal order covering a plan, if any.
    pub async fn find_active_for_plan(
        pool: &PgPool,
        plan_id: DbId,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders \
             WHERE plan_id = $1 AND status NOT IN ('Completed', 'Cancelled') \
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(plan_id)
            .fetch_optional(pool)
            .await
    }

    /// Move the due date of a still-planned order when its plan's schedule
    /// shifts.
    pub async fn update_due_date(
        pool: &PgPool,
        id: DbId,
        due_date: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE work_orders \
             SET due_date = $2, \
                 planned_date = LEAST(planned_date, $2), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(due_date)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Compare-and-set status transition. Returns `None` when the row no
    /// longer carries `expected_status`, meaning a concurrent writer won.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        new_status: &str,
        write: &TransitionWrite<'_>,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE work_orders SET \
                 status = $3, \
                 started_date = COALESCE($4, started_date), \
                 completed_date = COALESCE($5, completed_date), \
                 completed_by = COALESCE($6, completed_by), \
                 actual_hours = COALESCE($7, actual_hours), \
                 running_hours_at_completion = COALESCE($8, running_hours_at_completion), \
                 remarks = COALESCE($9, remarks), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(expected_status)
            .bind(new_status)
            .bind(write.started_date)
            .bind(write.completed_date)
            .bind(write.completed_by)
            .bind(write.actual_hours)
            .bind(write.running_hours_at_completion)
            .bind(write.remarks)
            .fetch_optional(pool)
            .await
    }

    /// Non-terminal orders past their due date, most overdue first.
    pub async fn list_overdue(
        pool: &PgPool,
        vessel_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders \
             WHERE status NOT IN ('Completed', 'Cancelled') \
               AND due_date < $2 \
               AND ($1::uuid IS NULL OR vessel_id = $1) \
             ORDER BY due_date ASC"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(vessel_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Non-terminal orders planned to start within the next `days` days.
    /// The window is keyed on `planned_date`; see
    /// [`keelson_core::work_order::is_upcoming`].
    pub async fn list_upcoming(
        pool: &PgPool,
        vessel_id: Option<DbId>,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let horizon = now + chrono::Duration::days(days);
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders \
             WHERE status NOT IN ('Completed', 'Cancelled') \
               AND planned_date <= $2 \
               AND ($1::uuid IS NULL OR vessel_id = $1) \
             ORDER BY due_date ASC"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(vessel_id)
            .bind(horizon)
            .fetch_all(pool)
            .await
    }

    /// Orders whose planned date falls inside `[start, end]`, for the
    /// calendar.
    pub async fn list_in_range(
        pool: &PgPool,
        vessel_id: Option<DbId>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders \
             WHERE planned_date >= $2 AND planned_date <= $3 \
               AND ($1::uuid IS NULL OR vessel_id = $1) \
             ORDER BY planned_date ASC"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(vessel_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// `(status, due_date)` projection of every order in scope, the input
    /// to the stats fold.
    pub async fn list_snapshot(
        pool: &PgPool,
        vessel_id: Option<DbId>,
    ) -> Result<Vec<WorkOrderSnapshotRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrderSnapshotRow>(
            "SELECT status, due_date FROM work_orders \
             WHERE ($1::uuid IS NULL OR vessel_id = $1)",
        )
        .bind(vessel_id)
        .fetch_all(pool)
        .await
    }
}
