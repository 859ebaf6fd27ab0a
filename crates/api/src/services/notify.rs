//! Work order notification fan-out.
//!
//! Two events fan out through the [`Notifier`] seam: a work order being
//! materialized (by the sweep or an ad-hoc create) and an open order
//! crossing its due date. The default sink is the log; a mail or
//! messaging integration plugs in behind the same trait.

use keelson_db::models::work_order::WorkOrder;

/// Sink for work order notifications.
pub trait Notifier: Send + Sync {
    /// A work order was created.
    fn notify_created(&self, order: &WorkOrder);

    /// An open work order is overdue.
    fn notify_overdue(&self, order: &WorkOrder);
}

/// Writes notifications to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_created(&self, order: &WorkOrder) {
        tracing::info!(
            order_id = %order.id,
            vessel_id = %order.vessel_id,
            equipment_id = %order.equipment_id,
            title = %order.title,
            due_date = %order.due_date,
            "Work order created"
        );
    }

    fn notify_overdue(&self, order: &WorkOrder) {
        tracing::warn!(
            order_id = %order.id,
            vessel_id = %order.vessel_id,
            equipment_id = %order.equipment_id,
            title = %order.title,
            due_date = %order.due_date,
            "Work order is overdue"
        );
    }
}
