//! Periodic maintenance sweep.
//!
//! Runs the plan sweep on a fixed interval using `tokio::time::interval`
//! and raises overdue notifications. The first pass announces everything
//! currently overdue, so orders that slipped past their due date while
//! the service was down are not silently absorbed; later passes announce
//! only the orders that crossed their due date since the previous pass.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use keelson_core::types::Timestamp;
use keelson_db::models::work_order::WorkOrder;
use keelson_db::repositories::WorkOrderRepo;
use keelson_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::config::SweepConfig;
use crate::services::notify::Notifier;
use crate::services::scheduler;

/// Liveness record of the sweep loop, surfaced by the health endpoint.
///
/// A single atomic millisecond timestamp; zero means no pass has
/// completed yet.
#[derive(Debug, Default)]
pub struct SweepHealth {
    last_pass_ms: AtomicI64,
}

impl SweepHealth {
    pub fn mark_pass(&self, at: Timestamp) {
        self.last_pass_ms.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    /// When the last sweep pass completed, if one has run at all.
    pub fn last_pass(&self) -> Option<Timestamp> {
        match self.last_pass_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }

    /// Alive means a pass completed within twice the configured interval.
    pub fn is_alive(&self, now: Timestamp, interval_secs: u64) -> bool {
        match self.last_pass() {
            Some(at) => (now - at).num_seconds() <= 2 * interval_secs as i64,
            None => false,
        }
    }
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    config: SweepConfig,
    health: Arc<SweepHealth>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.interval_secs,
        lead_window_days = config.lead_window_days,
        lead_window_hours = config.lead_window_hours,
        "Maintenance sweep started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
    let mut last_run: Option<Timestamp> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Maintenance sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let now = Utc::now();
                match scheduler::sweep_all(&pool, now, config.lead_window(), notifier.as_ref()).await {
                    Ok(summary) => {
                        tracing::debug!(
                            evaluated = summary.evaluated,
                            created = summary.orders_created,
                            refreshed = summary.orders_refreshed,
                            skipped = summary.skipped,
                            "Sweep pass complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep pass failed");
                    }
                }

                notify_overdue(&pool, last_run, now, notifier.as_ref()).await;
                last_run = Some(now);
                health.mark_pass(now);
            }
        }
    }
}

/// Announce overdue orders. On the first pass (`since` is `None`) every
/// currently overdue order is announced; afterwards only those whose due
/// date crossed into the past during `(since, now]`.
async fn notify_overdue(
    pool: &DbPool,
    since: Option<Timestamp>,
    now: Timestamp,
    notifier: &dyn Notifier,
) {
    match WorkOrderRepo::list_overdue(pool, None, now).await {
        Ok(orders) => {
            for order in orders.iter().filter(|o| crossed_since(o, since)) {
                notifier.notify_overdue(order);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to scan for overdue orders");
        }
    }
}

/// Whether an overdue order still needs announcing: everything on the
/// first pass, only fresh crossings afterwards.
fn crossed_since(order: &WorkOrder, since: Option<Timestamp>) -> bool {
    match since {
        None => true,
        Some(since) => order.due_date > since,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_core::types::DbId;

    fn order(due: Timestamp) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: DbId::new_v4(),
            plan_id: None,
            equipment_id: DbId::from_u128(2),
            vessel_id: DbId::from_u128(3),
            title: "Fuel filter renewal".into(),
            description: None,
            status: "Planned".into(),
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
    fn first_pass_announces_every_overdue_order() {
        // Orders already overdue when the service starts must not be
        // swallowed by the since-filter.
        assert!(crossed_since(&order(ts(2024, 1, 1)), None));
        assert!(crossed_since(&order(ts(2024, 6, 1)), None));
    }

    #[test]
    fn later_passes_announce_only_fresh_crossings() {
        let since = Some(ts(2024, 6, 1));
        assert!(crossed_since(&order(ts(2024, 6, 2)), since));
        assert!(!crossed_since(&order(ts(2024, 5, 20)), since));
    }

    #[test]
    fn sweep_health_reports_liveness() {
        let health = SweepHealth::default();
        let now = ts(2024, 6, 1);
        assert!(health.last_pass().is_none());
        assert!(!health.is_alive(now, 3600));

        health.mark_pass(now);
        assert_eq!(health.last_pass(), Some(now));
        assert!(health.is_alive(now + chrono::Duration::hours(1), 3600));
        assert!(!health.is_alive(now + chrono::Duration::hours(3), 3600));
    }
}
