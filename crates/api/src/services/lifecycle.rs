//! Work order lifecycle transitions.
//!
//! Legality is decided by the core state machine; the write itself is a
//! compare-and-set on the expected current status, so two users acting on
//! the same stale screen cannot both win. Completing a plan-linked order
//! feeds back into the plan: the anchor advances to the completion point
//! and the schedule is re-evaluated immediately.

use chrono::Utc;
use keelson_core::error::CoreError;
use keelson_core::plan::LeadWindow;
use keelson_core::types::DbId;
use keelson_core::work_order::{validate_completion, validate_transition, WorkOrderStatus};
use keelson_db::models::work_order::{TransitionWorkOrder, WorkOrder};
use keelson_db::repositories::work_order_repo::TransitionWrite;
use keelson_db::repositories::{EquipmentRepo, MaintenancePlanRepo, WorkOrderRepo};
use keelson_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::services::notify::Notifier;
use crate::services::scheduler;

/// Apply a status transition to a work order.
pub async fn transition(
    pool: &DbPool,
    order_id: DbId,
    input: &TransitionWorkOrder,
    actor: Option<DbId>,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<WorkOrder> {
    let order = WorkOrderRepo::get(pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "work_order",
            id: order_id,
        }))?;

    let from = order.status_enum().map_err(|_| {
        CoreError::Consistency(format!(
            "work order {} carries unknown status '{}'",
            order.id, order.status
        ))
    })?;
    let to = WorkOrderStatus::parse(&input.status)?;
    validate_transition(from, to)?;

    let now = Utc::now();
    let mut write = TransitionWrite {
        remarks: input.remarks.as_deref(),
        ..Default::default()
    };

    match to {
        WorkOrderStatus::InProgress => {
            write.started_date = Some(now);
        }
        WorkOrderStatus::Completed => {
            let actual = validate_completion(input.actual_hours)?;
            write.completed_date = Some(now);
            write.completed_by = actor;
            write.actual_hours = Some(actual);
            // Snapshot the ledger reading at completion; it becomes the
            // plan's new hour anchor.
            write.running_hours_at_completion = EquipmentRepo::get(pool, order.equipment_id)
                .await?
                .map(|e| e.current_running_hours);
        }
        _ => {}
    }

    let updated = WorkOrderRepo::transition(pool, order.id, from.as_str(), to.as_str(), &write)
        .await?
        .ok_or(AppError::Core(CoreError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }))?;

    tracing::info!(
        order_id = %updated.id,
        from = from.as_str(),
        to = to.as_str(),
        "Work order transitioned"
    );

    if to == WorkOrderStatus::Completed {
        if let Some(plan_id) = updated.plan_id {
            complete_plan_feedback(pool, plan_id, &updated, lead, notifier).await?;
        }
    }

    Ok(updated)
}

/// Advance the plan anchor to the completion point and re-evaluate the
/// schedule, so the next cycle's due point is strictly later.
async fn complete_plan_feedback(
    pool: &DbPool,
    plan_id: DbId,
    order: &WorkOrder,
    lead: LeadWindow,
    notifier: &dyn Notifier,
) -> AppResult<()> {
    let completed_at = order.completed_date.unwrap_or_else(Utc::now);
    MaintenancePlanRepo::set_last_done(
        pool,
        plan_id,
        completed_at,
        order.running_hours_at_completion,
    )
    .await?;

    if let Some(plan) = MaintenancePlanRepo::get(pool, plan_id).await? {
        scheduler::sweep_one(pool, &plan, Utc::now(), lead, notifier).await?;
    }
    Ok(())
}
