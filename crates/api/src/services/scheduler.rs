//! The maintenance sweep: recompute next-due caches and materialize work
//! orders for plans entering the lead window.
//!
//! The sweep is idempotent: every decision is recomputed from the plan
//! anchor and the ledger, so re-running it (timer tick, manual trigger,
//! post-ledger update) converges to the same state. A plan that cannot be
//! evaluated (bad stored unit, missing equipment) is skipped with a log
//! line and never blocks the rest of the pass.

use keelson_core::plan::{evaluate_plan, LeadWindow, SweepAction};
use keelson_core::types::{DbId, Timestamp};
use keelson_db::models::maintenance_plan::MaintenancePlan;
use keelson_db::models::work_order::CreateWorkOrder;
use keelson_db::repositories::{EquipmentRepo, MaintenancePlanRepo, WorkOrderRepo};
use keelson_db::DbPool;
use serde::Serialize;

use crate::error::AppResult;
use crate::services::notify::Notifier;

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepSummary {
    pub evaluated: u64,
    pub orders_created: u64,
    pub orders_refreshed: u64,
    pub skipped: u64,
}

/// Sweep every active plan in the fleet.
pub async fn sweep_all(
    pool: &DbPool,
    now: Timestamp,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<SweepSummary> {
    let plans = MaintenancePlanRepo::list_active(pool).await?;
    sweep_plans(pool, &plans, now, lead, notifier).await
}

/// Sweep only the plans tied to the given equipment, after a ledger update.
pub async fn sweep_equipment(
    pool: &DbPool,
    equipment_ids: &[DbId],
    now: Timestamp,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<SweepSummary> {
    if equipment_ids.is_empty() {
        return Ok(SweepSummary::default());
    }
    let plans = MaintenancePlanRepo::list_active_for_equipment(pool, equipment_ids).await?;
    sweep_plans(pool, &plans, now, lead, notifier).await
}

/// What the sweep did for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The plan could not be evaluated and was passed over.
    Skipped,
    Created,
    Refreshed,
    UpToDate,
}

async fn sweep_plans(
    pool: &DbPool,
    plans: &[MaintenancePlan],
    now: Timestamp,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<SweepSummary> {
    let mut summary = SweepSummary::default();
    for plan in plans {
        summary.evaluated += 1;
        match sweep_one(pool, plan, now, lead, notifier).await? {
            SweepOutcome::Skipped => summary.skipped += 1,
            SweepOutcome::Created => summary.orders_created += 1,
            SweepOutcome::Refreshed => summary.orders_refreshed += 1,
            SweepOutcome::UpToDate => {}
        }
    }
    Ok(summary)
}

/// Evaluate and apply the sweep decision for one plan.
pub async fn sweep_one(
    pool: &DbPool,
    plan: &MaintenancePlan,
    now: Timestamp,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<SweepOutcome> {
    let snapshot = match plan.snapshot() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(plan_id = %plan.id, error = %e, "Skipping unevaluable plan");
            return Ok(SweepOutcome::Skipped);
        }
    };

    let Some(equipment) = EquipmentRepo::get(pool, plan.equipment_id).await? else {
        tracing::warn!(
            plan_id = %plan.id,
            equipment_id = %plan.equipment_id,
            "Skipping plan whose equipment is missing"
        );
        return Ok(SweepOutcome::Skipped);
    };

    let active = WorkOrderRepo::find_active_for_plan(pool, plan.id).await?;

    let eval = match evaluate_plan(
        &snapshot,
        equipment.current_running_hours,
        active.is_some(),
        now,
        &lead,
    ) {
        Ok(eval) => eval,
        Err(e) => {
            tracing::warn!(plan_id = %plan.id, error = %e, "Skipping unevaluable plan");
            return Ok(SweepOutcome::Skipped);
        }
    };

    if eval.next_due_date != plan.next_due_date || eval.next_due_hours != plan.next_due_hours {
        MaintenancePlanRepo::set_next_due(pool, plan.id, eval.next_due_date, eval.next_due_hours)
            .await?;
    }

    let outcome = match eval.action {
        SweepAction::Create { due_date } => {
            create_order(pool, plan, now, due_date, notifier).await?;
            SweepOutcome::Created
        }
        SweepAction::Refresh { due_date } => {
            if let Some(order) = active {
                WorkOrderRepo::update_due_date(pool, order.id, due_date).await?;
                tracing::info!(
                    plan_id = %plan.id,
                    order_id = %order.id,
                    %due_date,
                    "Refreshed work order due date"
                );
            }
            SweepOutcome::Refreshed
        }
        SweepAction::UpToDate => SweepOutcome::UpToDate,
    };

    Ok(outcome)
}

/// Insert a plan-linked order. A concurrent sweep may win the race on
/// `uq_work_orders_active_plan`; that outcome is treated as success.
async fn create_order(
    pool: &DbPool,
    plan: &MaintenancePlan,
    now: Timestamp,
    due_date: Timestamp,
    notifier: &dyn Notifier,
) -> AppResult<()> {
    let input = CreateWorkOrder {
        equipment_id: plan.equipment_id,
        title: plan.title.clone(),
        description: plan.description.clone(),
        priority: Some(plan.priority.clone()),
        is_class_related: Some(plan.is_class_related),
        // Overdue plans get due dates in the past; planned_date must not
        // trail due_date.
        planned_date: now.min(due_date),
        due_date,
        assigned_to: None,
    };

    match WorkOrderRepo::insert(pool, plan.vessel_id, Some(plan.id), &input).await {
        Ok(order) => {
            tracing::debug!(plan_id = %plan.id, order_id = %order.id, "Materialized order from plan");
            notifier.notify_created(&order);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_work_orders_active_plan") =>
        {
            tracing::debug!(plan_id = %plan.id, "Concurrent sweep already created the order");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
