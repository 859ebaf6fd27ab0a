//! Work order entity models and DTOs.

use chrono::Utc;
use keelson_core::types::{DbId, Timestamp};
use keelson_core::work_order::{is_overdue, WorkOrderStatus};
use keelson_core::error::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `work_orders` table.
///
/// Rows are never deleted; history is audit-relevant. "Overdue" is not a
/// stored status, see [`WorkOrder::overdue`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrder {
    pub id: DbId,
    pub plan_id: Option<DbId>,
    pub equipment_id: DbId,
    pub vessel_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub is_class_related: bool,
    pub planned_date: Timestamp,
    pub due_date: Timestamp,
    pub started_date: Option<Timestamp>,
    pub completed_date: Option<Timestamp>,
    pub assigned_to: Option<DbId>,
    pub completed_by: Option<DbId>,
    pub actual_hours: Option<f64>,
    pub running_hours_at_completion: Option<f64>,
    pub remarks: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkOrder {
    /// Parse the stored status string into the closed enum.
    pub fn status_enum(&self) -> Result<WorkOrderStatus, CoreError> {
        WorkOrderStatus::parse(&self.status)
    }

    /// Derived overdue predicate against the live clock.
    pub fn overdue(&self, now: Timestamp) -> bool {
        match self.status_enum() {
            Ok(status) => is_overdue(status, Some(self.due_date), now),
            Err(_) => false,
        }
    }
}

/// A work order row plus its derived overdue flag, the shape every list
/// endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderView {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub is_overdue: bool,
}

impl WorkOrderView {
    /// Evaluate the overdue predicate at read time.
    pub fn at(order: WorkOrder, now: Timestamp) -> Self {
        let is_overdue = order.overdue(now);
        Self { order, is_overdue }
    }

    /// Evaluate against the current clock.
    pub fn now(order: WorkOrder) -> Self {
        Self::at(order, Utc::now())
    }
}

/// DTO for creating an ad-hoc work order via `POST /maintenance/work-orders`.
#[derive(Debug, Deserialize)]
pub struct CreateWorkOrder {
    pub equipment_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub is_class_related: Option<bool>,
    pub planned_date: Timestamp,
    pub due_date: Timestamp,
    pub assigned_to: Option<DbId>,
}

/// DTO for `PUT /maintenance/work-orders/{id}`: a status transition.
#[derive(Debug, Deserialize)]
pub struct TransitionWorkOrder {
    pub status: String,
    /// Required when transitioning to Completed.
    pub actual_hours: Option<f64>,
    pub remarks: Option<String>,
}

/// Query parameters for `GET /maintenance/work-orders`.
#[derive(Debug, Default, Deserialize)]
pub struct WorkOrderFilter {
    pub vessel_id: Option<DbId>,
    pub status: Option<String>,
    pub equipment_id: Option<DbId>,
}

/// Minimal `(status, due_date)` projection for stats folds.
#[derive(Debug, FromRow)]
pub struct WorkOrderSnapshotRow {
    pub status: String,
    pub due_date: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(status: &str, due: Timestamp) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: DbId::from_u128(1),
            plan_id: None,
            equipment_id: DbId::from_u128(2),
            vessel_id: DbId::from_u128(3),
            title: "Oil change".into(),
            description: None,
            status: status.into(),
            priority: "Medium".into(),
            is_class_related: false,
            planned_date: due,
            due_date: due,
            started_date: None,
            completed_date: None,
            assigned_to: None,
            completed_by: None,
            actual_hours: None,
            running_hours_at_completion: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn open_order_past_due_is_overdue() {
        let o = order("Planned", ts(2024, 6, 1));
        assert!(o.overdue(ts(2024, 6, 2)));
        assert!(!o.overdue(ts(2024, 5, 30)));
    }

    #[test]
    fn completed_order_is_never_overdue() {
        let o = order("Completed", ts(2024, 6, 1));
        assert!(!o.overdue(ts(2024, 6, 2)));
    }

    #[test]
    fn unknown_stored_status_is_not_overdue() {
        // Legacy rows with a bad status must not trip the flag.
        let o = order("Overdue", ts(2024, 6, 1));
        assert!(!o.overdue(ts(2024, 6, 2)));
        assert!(o.status_enum().is_err());
    }

    #[test]
    fn view_carries_the_derived_flag() {
        let view = WorkOrderView::at(order("InProgress", ts(2024, 6, 1)), ts(2024, 6, 2));
        assert!(view.is_overdue);
    }
}
