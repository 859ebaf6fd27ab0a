//! Read-side work order aggregation for fleet dashboards.

use serde::Serialize;

use crate::types::Timestamp;
use crate::work_order::{is_overdue, WorkOrderStatus};

/// Work order counts and completion rate for one vessel or the whole fleet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkOrderStats {
    pub total: u64,
    pub planned: u64,
    pub in_progress: u64,
    pub completed: u64,
    /// Derived: non-terminal and past due at evaluation time.
    pub overdue: u64,
    /// `completed / total` as a fraction, 0.0 when there are no orders.
    pub completion_rate: f64,
}

/// Fold `(status, due_date)` pairs into dashboard stats.
///
/// Cancelled and postponed orders count toward `total` but have no
/// dedicated bucket; overdue is evaluated per order against `now`.
pub fn compute_stats<I>(orders: I, now: Timestamp) -> WorkOrderStats
where
    I: IntoIterator<Item = (WorkOrderStatus, Option<Timestamp>)>,
{
    let mut stats = WorkOrderStats::default();
    for (status, due_date) in orders {
        stats.total += 1;
        match status {
            WorkOrderStatus::Planned => stats.planned += 1,
            WorkOrderStatus::InProgress => stats.in_progress += 1,
            WorkOrderStatus::Completed => stats.completed += 1,
            WorkOrderStatus::Postponed | WorkOrderStatus::Cancelled => {}
        }
        if is_overdue(status, due_date, now) {
            stats.overdue += 1;
        }
    }
    if stats.total > 0 {
        stats.completion_rate = stats.completed as f64 / stats.total as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use WorkOrderStatus::*;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = compute_stats(Vec::new(), ts(2024, 6, 1));
        assert_eq!(stats, WorkOrderStats::default());
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn mixed_fleet_counts() {
        let now = ts(2024, 6, 15);
        let future = Some(ts(2024, 7, 1));
        let past = Some(ts(2024, 6, 1));
        let orders = vec![
            (Planned, past),        // overdue
            (Planned, future),
            (InProgress, future),
            (Completed, past),      // closed, not overdue
            (Completed, future),
            (Completed, None),
            (Cancelled, past),      // closed, not overdue
        ];
        let stats = compute_stats(orders, now);

        assert_eq!(stats.total, 7);
        assert_eq!(stats.planned, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.overdue, 1);
        assert!((stats.completion_rate - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn all_completed_has_full_rate() {
        let orders = vec![(Completed, None), (Completed, None)];
        let stats = compute_stats(orders, ts(2024, 6, 1));
        assert_eq!(stats.completion_rate, 1.0);
    }

    #[test]
    fn overdue_counts_postponed_orders() {
        let orders = vec![(Postponed, Some(ts(2024, 5, 1)))];
        let stats = compute_stats(orders, ts(2024, 6, 1));
        assert_eq!(stats.total, 1);
        assert_eq!(stats.overdue, 1);
    }
}
