//! Maintenance plan scheduling: next-due derivation and the lead-window
//! decision that drives work order creation.
//!
//! A plan is a recurring rule (`interval_value` + `interval_unit`) anchored
//! at its last completion. The sweep recomputes `next_due` from that anchor
//! and decides whether a work order must exist. Decisions are pure; the
//! sweep service in `keelson-api` persists them.

use chrono::{Duration, Months};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Lead window policy
// ---------------------------------------------------------------------------

/// Default lead window for date-based intervals: an order must exist once
/// the due date is within this many days.
pub const DEFAULT_LEAD_WINDOW_DAYS: i64 = 30;

/// Default lead window for hour-based intervals: an order must exist once
/// the remaining running hours drop to this threshold.
pub const DEFAULT_LEAD_WINDOW_HOURS: f64 = 500.0;

/// Lead-window policy, overridable per deployment.
#[derive(Debug, Clone, Copy)]
pub struct LeadWindow {
    pub days: i64,
    pub hours: f64,
}

impl Default for LeadWindow {
    fn default() -> Self {
        Self {
            days: DEFAULT_LEAD_WINDOW_DAYS,
            hours: DEFAULT_LEAD_WINDOW_HOURS,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Unit of a plan's recurring interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Hours,
    Days,
    Months,
}

impl IntervalUnit {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
        }
    }

    /// Parse from a string, returning an error for unknown units.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "hours" => Ok(Self::Hours),
            "days" => Ok(Self::Days),
            "months" => Ok(Self::Months),
            other => Err(CoreError::Validation(format!(
                "Unknown interval unit: '{other}'. Valid units: hours, days, months"
            ))),
        }
    }
}

/// Maintenance priority, inherited by spawned work orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Parse from a string, returning an error for unknown priorities.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "Critical" => Ok(Self::Critical),
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(CoreError::Validation(format!(
                "Unknown priority: '{other}'. Valid priorities: Critical, High, Medium, Low"
            ))),
        }
    }
}

/// Validate an interval definition. The value must be positive and finite;
/// day/month intervals must be whole numbers (calendar arithmetic).
pub fn validate_interval(unit: IntervalUnit, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::Validation(
            "interval_value must be a positive number".to_string(),
        ));
    }
    match unit {
        IntervalUnit::Hours => Ok(()),
        IntervalUnit::Days | IntervalUnit::Months => {
            if value.fract() != 0.0 {
                Err(CoreError::Validation(format!(
                    "interval_value must be a whole number of {}",
                    unit.as_str()
                )))
            } else {
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Next-due derivation
// ---------------------------------------------------------------------------

/// The scheduling-relevant slice of a maintenance plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanSnapshot {
    pub interval_unit: IntervalUnit,
    pub interval_value: f64,
    pub last_done_date: Option<Timestamp>,
    pub last_done_hours: Option<f64>,
    /// Cached next-due fields as currently persisted, used to detect when a
    /// completion elsewhere moved the schedule.
    pub next_due_date: Option<Timestamp>,
    pub next_due_hours: Option<f64>,
}

/// A computed next-due point: a calendar date, or a running-hours target
/// compared against the equipment's cumulative hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComputedDue {
    Date(Timestamp),
    Hours(f64),
}

/// Recompute a plan's next-due point as `last_done + interval`.
///
/// Returns `Ok(None)` when the plan has no baseline yet (no `last_done_date`
/// for date units, no `last_done_hours` for the hours unit); such plans are
/// skipped by the sweep until a baseline is set.
pub fn compute_next_due(plan: &PlanSnapshot) -> Result<Option<ComputedDue>, CoreError> {
    validate_interval(plan.interval_unit, plan.interval_value)?;
    match plan.interval_unit {
        IntervalUnit::Hours => Ok(plan
            .last_done_hours
            .map(|h| ComputedDue::Hours(h + plan.interval_value))),
        IntervalUnit::Days => {
            let Some(anchor) = plan.last_done_date else {
                return Ok(None);
            };
            Ok(Some(ComputedDue::Date(
                anchor + Duration::days(plan.interval_value as i64),
            )))
        }
        IntervalUnit::Months => {
            let Some(anchor) = plan.last_done_date else {
                return Ok(None);
            };
            let due = anchor
                .checked_add_months(Months::new(plan.interval_value as u32))
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "next_due overflow adding {} months to {anchor}",
                        plan.interval_value
                    ))
                })?;
            Ok(Some(ComputedDue::Date(due)))
        }
    }
}

/// Whether a due point has entered the lead window (or is already past).
pub fn in_lead_window(
    due: &ComputedDue,
    now: Timestamp,
    current_running_hours: f64,
    lead: &LeadWindow,
) -> bool {
    match due {
        ComputedDue::Date(d) => *d - now <= Duration::days(lead.days),
        ComputedDue::Hours(h) => h - current_running_hours <= lead.hours,
    }
}

/// Concrete `due_date` for a work order spawned from a due point.
///
/// Hour-based targets are projected onto the calendar assuming continuous
/// operation (remaining hours elapse in real time); already-reached targets
/// are due immediately.
pub fn order_due_date(due: &ComputedDue, now: Timestamp, current_running_hours: f64) -> Timestamp {
    match due {
        ComputedDue::Date(d) => *d,
        ComputedDue::Hours(h) => {
            let remaining = (h - current_running_hours).max(0.0);
            now + Duration::seconds((remaining * 3600.0) as i64)
        }
    }
}

// ---------------------------------------------------------------------------
// Sweep decision
// ---------------------------------------------------------------------------

/// What the sweep must do for one plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepAction {
    /// No active order exists and the due point is inside the lead window.
    Create { due_date: Timestamp },
    /// An active order exists but the plan's next-due moved; its `due_date`
    /// must be refreshed.
    Refresh { due_date: Timestamp },
    /// Nothing to do.
    UpToDate,
}

/// Result of evaluating one plan: the next-due fields to cache on the plan
/// row plus the order-side action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEvaluation {
    pub next_due_date: Option<Timestamp>,
    pub next_due_hours: Option<f64>,
    pub action: SweepAction,
}

/// Evaluate one plan against the current ledger state.
///
/// `has_active_order` reflects whether a non-terminal work order already
/// exists for the plan; creation is idempotent on that predicate, so a plan
/// never holds two simultaneously active orders.
pub fn evaluate_plan(
    plan: &PlanSnapshot,
    current_running_hours: f64,
    has_active_order: bool,
    now: Timestamp,
    lead: &LeadWindow,
) -> Result<PlanEvaluation, CoreError> {
    let Some(due) = compute_next_due(plan)? else {
        return Ok(PlanEvaluation {
            next_due_date: None,
            next_due_hours: None,
            action: SweepAction::UpToDate,
        });
    };

    let (next_due_date, next_due_hours) = match due {
        ComputedDue::Date(d) => (Some(d), None),
        ComputedDue::Hours(h) => (None, Some(h)),
    };

    let due_date = order_due_date(&due, now, current_running_hours);

    let action = if has_active_order {
        // Refresh only when the cached next-due moved (e.g. a completion
        // elsewhere advanced the anchor), never on every sweep tick.
        let moved = next_due_date != plan.next_due_date || next_due_hours != plan.next_due_hours;
        if moved {
            SweepAction::Refresh { due_date }
        } else {
            SweepAction::UpToDate
        }
    } else if in_lead_window(&due, now, current_running_hours, lead) {
        SweepAction::Create { due_date }
    } else {
        SweepAction::UpToDate
    };

    Ok(PlanEvaluation {
        next_due_date,
        next_due_hours,
        action,
    })
}

/// Advance a plan's anchor after a linked work order completes.
///
/// Returns the snapshot with `last_done` moved to the completion point; the
/// caller recomputes and persists `next_due` from it.
pub fn advance_baseline(
    plan: &PlanSnapshot,
    completed_at: Timestamp,
    hours_at_completion: Option<f64>,
) -> PlanSnapshot {
    PlanSnapshot {
        last_done_date: Some(completed_at),
        last_done_hours: hours_at_completion.or(plan.last_done_hours),
        ..*plan
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn month_plan(last_done: Timestamp, months: f64) -> PlanSnapshot {
        PlanSnapshot {
            interval_unit: IntervalUnit::Months,
            interval_value: months,
            last_done_date: Some(last_done),
            last_done_hours: None,
            next_due_date: None,
            next_due_hours: None,
        }
    }

    fn hour_plan(last_done_hours: f64, interval: f64) -> PlanSnapshot {
        PlanSnapshot {
            interval_unit: IntervalUnit::Hours,
            interval_value: interval,
            last_done_date: None,
            last_done_hours: Some(last_done_hours),
            next_due_date: None,
            next_due_hours: None,
        }
    }

    // -- validate_interval ----------------------------------------------------

    #[test]
    fn positive_intervals_valid() {
        assert!(validate_interval(IntervalUnit::Hours, 12_000.0).is_ok());
        assert!(validate_interval(IntervalUnit::Days, 90.0).is_ok());
        assert!(validate_interval(IntervalUnit::Months, 6.0).is_ok());
    }

    #[test]
    fn zero_and_negative_intervals_rejected() {
        assert_matches!(validate_interval(IntervalUnit::Hours, 0.0), Err(CoreError::Validation(_)));
        assert_matches!(validate_interval(IntervalUnit::Months, -1.0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn fractional_calendar_intervals_rejected() {
        assert_matches!(validate_interval(IntervalUnit::Months, 1.5), Err(CoreError::Validation(_)));
        assert_matches!(validate_interval(IntervalUnit::Days, 0.5), Err(CoreError::Validation(_)));
        // Fractional hours are fine.
        assert!(validate_interval(IntervalUnit::Hours, 0.5).is_ok());
    }

    // -- compute_next_due -----------------------------------------------------

    #[test]
    fn six_months_from_january_first() {
        let plan = month_plan(ts(2024, 1, 1), 6.0);
        let due = compute_next_due(&plan).unwrap().unwrap();
        assert_eq!(due, ComputedDue::Date(ts(2024, 7, 1)));
    }

    #[test]
    fn month_end_clamps() {
        // Jan 31 + 1 month clamps to Feb 29 (2024 is a leap year).
        let plan = month_plan(ts(2024, 1, 31), 1.0);
        let due = compute_next_due(&plan).unwrap().unwrap();
        assert_eq!(due, ComputedDue::Date(ts(2024, 2, 29)));
    }

    #[test]
    fn day_interval_adds_days() {
        let plan = PlanSnapshot {
            interval_unit: IntervalUnit::Days,
            interval_value: 90.0,
            last_done_date: Some(ts(2024, 1, 1)),
            last_done_hours: None,
            next_due_date: None,
            next_due_hours: None,
        };
        let due = compute_next_due(&plan).unwrap().unwrap();
        assert_eq!(due, ComputedDue::Date(ts(2024, 3, 31)));
    }

    #[test]
    fn hour_interval_adds_hours() {
        let due = compute_next_due(&hour_plan(10_000.0, 12_000.0)).unwrap().unwrap();
        assert_eq!(due, ComputedDue::Hours(22_000.0));
    }

    #[test]
    fn plan_without_baseline_has_no_due() {
        let plan = PlanSnapshot {
            interval_unit: IntervalUnit::Months,
            interval_value: 6.0,
            last_done_date: None,
            last_done_hours: None,
            next_due_date: None,
            next_due_hours: None,
        };
        assert_eq!(compute_next_due(&plan).unwrap(), None);
    }

    // -- in_lead_window -------------------------------------------------------

    #[test]
    fn date_due_outside_window() {
        let due = ComputedDue::Date(ts(2024, 7, 1));
        let lead = LeadWindow::default();
        // 47 days out.
        assert!(!in_lead_window(&due, ts(2024, 5, 15), 0.0, &lead));
    }

    #[test]
    fn date_due_inside_window() {
        let due = ComputedDue::Date(ts(2024, 7, 1));
        let lead = LeadWindow::default();
        // 26 days out.
        assert!(in_lead_window(&due, ts(2024, 6, 5), 0.0, &lead));
    }

    #[test]
    fn past_due_date_is_inside_window() {
        let due = ComputedDue::Date(ts(2024, 7, 1));
        assert!(in_lead_window(&due, ts(2024, 8, 1), 0.0, &LeadWindow::default()));
    }

    #[test]
    fn hours_due_respects_remaining_threshold() {
        let due = ComputedDue::Hours(22_000.0);
        let lead = LeadWindow::default();
        assert!(!in_lead_window(&due, ts(2024, 1, 1), 21_000.0, &lead)); // 1000h left
        assert!(in_lead_window(&due, ts(2024, 1, 1), 21_600.0, &lead)); // 400h left
        assert!(in_lead_window(&due, ts(2024, 1, 1), 22_500.0, &lead)); // past target
    }

    // -- order_due_date -------------------------------------------------------

    #[test]
    fn date_due_passes_through() {
        let due = ComputedDue::Date(ts(2024, 7, 1));
        assert_eq!(order_due_date(&due, ts(2024, 6, 5), 0.0), ts(2024, 7, 1));
    }

    #[test]
    fn hours_due_projects_remaining_onto_calendar() {
        let due = ComputedDue::Hours(22_000.0);
        let now = ts(2024, 6, 5);
        // 240 hours remaining -> 10 days of continuous operation.
        assert_eq!(order_due_date(&due, now, 21_760.0), now + Duration::days(10));
    }

    #[test]
    fn reached_hours_target_is_due_now() {
        let due = ComputedDue::Hours(22_000.0);
        let now = ts(2024, 6, 5);
        assert_eq!(order_due_date(&due, now, 23_000.0), now);
    }

    // -- evaluate_plan --------------------------------------------------------

    #[test]
    fn outside_window_creates_nothing() {
        let plan = month_plan(ts(2024, 1, 1), 6.0);
        let eval = evaluate_plan(&plan, 0.0, false, ts(2024, 5, 15), &LeadWindow::default()).unwrap();
        assert_eq!(eval.next_due_date, Some(ts(2024, 7, 1)));
        assert_eq!(eval.action, SweepAction::UpToDate);
    }

    #[test]
    fn inside_window_creates_order_with_due_date() {
        let plan = month_plan(ts(2024, 1, 1), 6.0);
        let eval = evaluate_plan(&plan, 0.0, false, ts(2024, 6, 5), &LeadWindow::default()).unwrap();
        assert_eq!(eval.action, SweepAction::Create { due_date: ts(2024, 7, 1) });
    }

    #[test]
    fn active_order_suppresses_creation() {
        let mut plan = month_plan(ts(2024, 1, 1), 6.0);
        plan.next_due_date = Some(ts(2024, 7, 1)); // cache already current
        let eval = evaluate_plan(&plan, 0.0, true, ts(2024, 6, 5), &LeadWindow::default()).unwrap();
        assert_eq!(eval.action, SweepAction::UpToDate);
    }

    #[test]
    fn moved_next_due_refreshes_active_order() {
        let mut plan = month_plan(ts(2024, 2, 1), 6.0);
        // Cache still holds the pre-completion due point.
        plan.next_due_date = Some(ts(2024, 7, 1));
        let eval = evaluate_plan(&plan, 0.0, true, ts(2024, 6, 5), &LeadWindow::default()).unwrap();
        assert_eq!(eval.action, SweepAction::Refresh { due_date: ts(2024, 8, 1) });
        assert_eq!(eval.next_due_date, Some(ts(2024, 8, 1)));
    }

    #[test]
    fn hour_plan_inside_window_creates() {
        let plan = hour_plan(10_000.0, 12_000.0);
        let eval = evaluate_plan(&plan, 21_600.0, false, ts(2024, 6, 5), &LeadWindow::default()).unwrap();
        assert_eq!(eval.next_due_hours, Some(22_000.0));
        assert_matches!(eval.action, SweepAction::Create { .. });
    }

    #[test]
    fn baseline_less_plan_is_skipped() {
        let plan = PlanSnapshot {
            interval_unit: IntervalUnit::Hours,
            interval_value: 12_000.0,
            last_done_date: None,
            last_done_hours: None,
            next_due_date: None,
            next_due_hours: None,
        };
        let eval = evaluate_plan(&plan, 5_000.0, false, ts(2024, 6, 5), &LeadWindow::default()).unwrap();
        assert_eq!(eval.action, SweepAction::UpToDate);
        assert_eq!(eval.next_due_hours, None);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let plan = month_plan(ts(2024, 1, 1), 6.0);
        let now = ts(2024, 6, 5);
        let lead = LeadWindow::default();
        let first = evaluate_plan(&plan, 0.0, false, now, &lead).unwrap();
        let second = evaluate_plan(&plan, 0.0, false, now, &lead).unwrap();
        assert_eq!(first, second);
    }

    // -- advance_baseline -----------------------------------------------------

    #[test]
    fn completion_advances_to_strictly_later_due() {
        let plan = month_plan(ts(2024, 1, 1), 6.0);
        let before = compute_next_due(&plan).unwrap().unwrap();

        let advanced = advance_baseline(&plan, ts(2024, 6, 20), None);
        let after = compute_next_due(&advanced).unwrap().unwrap();

        let (ComputedDue::Date(before), ComputedDue::Date(after)) = (before, after) else {
            panic!("expected date due points");
        };
        assert!(after > before);
        assert_eq!(after, ts(2024, 12, 20));
    }

    #[test]
    fn completion_advances_hour_anchor() {
        let plan = hour_plan(10_000.0, 12_000.0);
        let advanced = advance_baseline(&plan, ts(2024, 6, 20), Some(21_900.0));
        assert_eq!(advanced.last_done_hours, Some(21_900.0));
        let due = compute_next_due(&advanced).unwrap().unwrap();
        assert_eq!(due, ComputedDue::Hours(33_900.0));
    }

    #[test]
    fn completion_without_hours_keeps_old_anchor() {
        let plan = hour_plan(10_000.0, 12_000.0);
        let advanced = advance_baseline(&plan, ts(2024, 6, 20), None);
        assert_eq!(advanced.last_done_hours, Some(10_000.0));
    }

    // -- enum parsing ---------------------------------------------------------

    #[test]
    fn interval_unit_round_trip() {
        for u in [IntervalUnit::Hours, IntervalUnit::Days, IntervalUnit::Months] {
            assert_eq!(IntervalUnit::parse(u.as_str()).unwrap(), u);
        }
    }

    #[test]
    fn unknown_interval_unit_rejected() {
        assert_matches!(IntervalUnit::parse("weeks"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn priority_round_trip() {
        for p in [Priority::Critical, Priority::High, Priority::Medium, Priority::Low] {
            assert_eq!(Priority::parse(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_priority_rejected() {
        assert_matches!(Priority::parse("Urgent"), Err(CoreError::Validation(_)));
    }
}
