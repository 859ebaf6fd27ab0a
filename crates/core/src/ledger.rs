//! Running-hours ledger arithmetic.
//!
//! The ledger owns the cumulative invariant
//! `total(d) = initial_running_hours + Σ daily_hours for dates <= d`.
//! Persistence lives in `keelson-db`; this module holds the pure pieces:
//! per-record validation, cumulative recomputation after a backfill, and
//! the zero-filled history window used for fixed-width charts.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;

/// Daily hours above this are accepted but logged; a day has 24 hours, but
/// crews occasionally batch two days into one entry.
pub const POLICY_MAX_DAILY_HOURS: f64 = 24.0;

/// Validate a single daily-hours value. Only negatives (and NaN) are hard
/// failures; the 24h bound is policy, not an invariant.
pub fn validate_daily_hours(daily_hours: f64) -> Result<(), CoreError> {
    if daily_hours.is_nan() || daily_hours < 0.0 {
        return Err(CoreError::Validation(
            "daily_hours must be >= 0".to_string(),
        ));
    }
    Ok(())
}

/// True when a value is allowed but outside the 0..=24 policy band.
pub fn exceeds_daily_policy(daily_hours: f64) -> bool {
    daily_hours > POLICY_MAX_DAILY_HOURS
}

// ---------------------------------------------------------------------------
// Cumulative recomputation
// ---------------------------------------------------------------------------

/// One ledger entry, date plus the hours run that day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyEntry {
    pub recorded_date: NaiveDate,
    pub daily_hours: f64,
}

/// Recompute cumulative totals for a run of entries.
///
/// `baseline` is the cumulative total just before the first entry (the
/// equipment's `initial_running_hours` when recomputing from the start).
/// Entries must be sorted by date ascending; the result is one total per
/// entry, in the same order. Used for full rebuilds and for the
/// forward-recompute after a backfilled overwrite.
pub fn recompute_totals(baseline: f64, entries: &[DailyEntry]) -> Vec<f64> {
    let mut running = baseline;
    entries
        .iter()
        .map(|e| {
            running += e.daily_hours;
            running
        })
        .collect()
}

// ---------------------------------------------------------------------------
// History window
// ---------------------------------------------------------------------------

/// One day in an equipment's hours history. `recorded` is false for
/// zero-filled gap days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub recorded_date: NaiveDate,
    pub daily_hours: f64,
    pub total_hours: f64,
    pub recorded: bool,
}

/// Lazy, finite, restartable sequence of [`HistoryPoint`]s covering every
/// date in a trailing window, oldest first.
///
/// Dates with no ledger record yield `daily_hours = 0` and the last known
/// cumulative total carried forward, so chart consumers always get exactly
/// `days` points. Restart by cloning before iteration.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    cursor: NaiveDate,
    end: NaiveDate,
    carried_total: f64,
    /// Remaining records inside the window, oldest first.
    records: std::vec::IntoIter<(NaiveDate, f64, f64)>,
    next_record: Option<(NaiveDate, f64, f64)>,
}

impl HistoryWindow {
    /// Build a window over `[start, end]` (inclusive).
    ///
    /// `baseline_total` is the cumulative total just before `start`, used to
    /// fill leading gaps. `records` are `(date, daily, total)` rows within
    /// the window, sorted ascending; rows outside the window are skipped.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        baseline_total: f64,
        records: Vec<(NaiveDate, f64, f64)>,
    ) -> Self {
        let mut iter = records
            .into_iter()
            .filter(|(d, _, _)| *d >= start && *d <= end)
            .collect::<Vec<_>>()
            .into_iter();
        let next_record = iter.next();
        Self {
            cursor: start,
            end,
            carried_total: baseline_total,
            records: iter,
            next_record,
        }
    }
}

impl Iterator for HistoryWindow {
    type Item = HistoryPoint;

    fn next(&mut self) -> Option<HistoryPoint> {
        if self.cursor > self.end {
            return None;
        }
        let date = self.cursor;
        self.cursor = date.succ_opt()?;

        let point = match self.next_record {
            Some((d, daily, total)) if d == date => {
                self.next_record = self.records.next();
                self.carried_total = total;
                HistoryPoint {
                    recorded_date: date,
                    daily_hours: daily,
                    total_hours: total,
                    recorded: true,
                }
            }
            _ => HistoryPoint {
                recorded_date: date,
                daily_hours: 0.0,
                total_hours: self.carried_total,
                recorded: false,
            },
        };
        Some(point)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    // -- validate_daily_hours -------------------------------------------------

    #[test]
    fn zero_hours_valid() {
        assert!(validate_daily_hours(0.0).is_ok());
    }

    #[test]
    fn normal_hours_valid() {
        assert!(validate_daily_hours(8.5).is_ok());
    }

    #[test]
    fn negative_hours_rejected() {
        let err = validate_daily_hours(-3.0).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: daily_hours must be >= 0");
    }

    #[test]
    fn nan_hours_rejected() {
        assert_matches!(validate_daily_hours(f64::NAN), Err(CoreError::Validation(_)));
    }

    #[test]
    fn over_24_is_policy_not_error() {
        assert!(validate_daily_hours(26.0).is_ok());
        assert!(exceeds_daily_policy(26.0));
        assert!(!exceeds_daily_policy(24.0));
    }

    // -- recompute_totals -----------------------------------------------------

    #[test]
    fn totals_accumulate_from_baseline() {
        let entries = [
            DailyEntry { recorded_date: d(1), daily_hours: 8.0 },
            DailyEntry { recorded_date: d(2), daily_hours: 10.0 },
            DailyEntry { recorded_date: d(3), daily_hours: 0.0 },
        ];
        assert_eq!(recompute_totals(100.0, &entries), vec![108.0, 118.0, 118.0]);
    }

    #[test]
    fn totals_of_empty_run_is_empty() {
        assert!(recompute_totals(50.0, &[]).is_empty());
    }

    #[test]
    fn totals_non_decreasing_for_valid_entries() {
        let entries: Vec<DailyEntry> = (1..=20)
            .map(|i| DailyEntry {
                recorded_date: d(i),
                daily_hours: (i % 5) as f64 * 3.5,
            })
            .collect();
        let totals = recompute_totals(1_000.0, &entries);
        assert!(totals.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn backfill_overwrite_recomputes_downstream() {
        // Original run: 8, 8, 8 over baseline 100 -> 108, 116, 124.
        // Overwrite day 2 to 2 hours; downstream recompute starts from the
        // total as of day 1.
        let downstream = [
            DailyEntry { recorded_date: d(2), daily_hours: 2.0 },
            DailyEntry { recorded_date: d(3), daily_hours: 8.0 },
        ];
        assert_eq!(recompute_totals(108.0, &downstream), vec![110.0, 118.0]);
    }

    // -- HistoryWindow --------------------------------------------------------

    #[test]
    fn window_covers_every_date() {
        let win = HistoryWindow::new(d(1), d(7), 0.0, vec![]);
        let points: Vec<_> = win.collect();
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].recorded_date, d(1));
        assert_eq!(points[6].recorded_date, d(7));
    }

    #[test]
    fn gaps_are_zero_filled_with_carried_total() {
        let records = vec![(d(2), 8.0, 108.0), (d(5), 4.0, 112.0)];
        let points: Vec<_> = HistoryWindow::new(d(1), d(6), 100.0, records).collect();

        // Day 1: gap before any record, baseline carried.
        assert_eq!(points[0], HistoryPoint {
            recorded_date: d(1),
            daily_hours: 0.0,
            total_hours: 100.0,
            recorded: false,
        });
        // Day 2: recorded.
        assert!(points[1].recorded);
        assert_eq!(points[1].total_hours, 108.0);
        // Days 3-4: gap, total carried from day 2.
        assert_eq!(points[2].total_hours, 108.0);
        assert!(!points[2].recorded);
        assert_eq!(points[3].total_hours, 108.0);
        // Day 5: recorded.
        assert_eq!(points[4].total_hours, 112.0);
        // Day 6: trailing gap.
        assert_eq!(points[5].total_hours, 112.0);
        assert_eq!(points[5].daily_hours, 0.0);
    }

    #[test]
    fn records_outside_window_ignored() {
        let records = vec![(d(1), 8.0, 108.0), (d(20), 8.0, 116.0)];
        let points: Vec<_> = HistoryWindow::new(d(2), d(4), 108.0, records).collect();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| !p.recorded));
        assert!(points.iter().all(|p| p.total_hours == 108.0));
    }

    #[test]
    fn window_is_restartable_by_cloning() {
        let win = HistoryWindow::new(d(1), d(3), 0.0, vec![(d(2), 5.0, 5.0)]);
        let first: Vec<_> = win.clone().collect();
        let second: Vec<_> = win.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn single_day_window() {
        let points: Vec<_> = HistoryWindow::new(d(4), d(4), 9.0, vec![(d(4), 1.0, 10.0)]).collect();
        assert_eq!(points.len(), 1);
        assert!(points[0].recorded);
        assert_eq!(points[0].total_hours, 10.0);
    }
}
