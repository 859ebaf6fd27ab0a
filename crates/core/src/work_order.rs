//! Work order lifecycle: the status state machine and the derived
//! overdue predicate.
//!
//! "Overdue" is never a stored status. It is evaluated at read time from
//! `due_date` and the live clock wherever status is displayed or filtered,
//! so it can never drift out of sync.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Work order status. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Planned,
    InProgress,
    Completed,
    Postponed,
    Cancelled,
}

impl WorkOrderStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Postponed => "Postponed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "Planned" => Ok(Self::Planned),
            "InProgress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Postponed" => Ok(Self::Postponed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown work order status: '{other}'"
            ))),
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns the set of valid target statuses reachable from `from`.
///
/// Terminal states return an empty slice.
pub fn valid_transitions(from: WorkOrderStatus) -> &'static [WorkOrderStatus] {
    use WorkOrderStatus::*;
    match from {
        // Planned -> start, complete, defer, cancel
        Planned => &[InProgress, Completed, Postponed, Cancelled],
        // InProgress -> complete, defer, cancel
        InProgress => &[Completed, Postponed, Cancelled],
        // Postponed -> resume, cancel
        Postponed => &[Planned, Cancelled],
        // Terminal
        Completed | Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning [`CoreError::InvalidTransition`]
/// for illegal ones (including any move out of a terminal state).
pub fn validate_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

/// Completion requires the actual hours spent.
pub fn validate_completion(actual_hours: Option<f64>) -> Result<f64, CoreError> {
    match actual_hours {
        Some(h) if h.is_finite() && h >= 0.0 => Ok(h),
        Some(_) => Err(CoreError::Validation(
            "actual_hours must be >= 0".to_string(),
        )),
        None => Err(CoreError::Validation(
            "actual_hours is required to complete a work order".to_string(),
        )),
    }
}

/// Orders must not be due before they are planned.
pub fn validate_schedule(planned_date: Timestamp, due_date: Timestamp) -> Result<(), CoreError> {
    if due_date < planned_date {
        return Err(CoreError::Validation(
            "due_date must not be earlier than planned_date".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Overdue predicate
// ---------------------------------------------------------------------------

/// The derived overdue predicate: past due and not terminally closed.
pub fn is_overdue(status: WorkOrderStatus, due_date: Option<Timestamp>, now: Timestamp) -> bool {
    match due_date {
        Some(due) => due < now && !status.is_terminal(),
        None => false,
    }
}

/// The upcoming predicate: open and scheduled to start within the horizon.
///
/// Upcoming is keyed on `planned_date`, not `due_date`: an order planned
/// for next week belongs on the crew's upcoming list even when its due
/// date lies beyond the horizon.
pub fn is_upcoming(
    status: WorkOrderStatus,
    planned_date: Timestamp,
    now: Timestamp,
    horizon_days: i64,
) -> bool {
    !status.is_terminal() && planned_date <= now + chrono::Duration::days(horizon_days)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use WorkOrderStatus::*;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // -- Valid transitions ----------------------------------------------------

    #[test]
    fn planned_to_in_progress() {
        assert!(can_transition(Planned, InProgress));
    }

    #[test]
    fn planned_to_completed() {
        assert!(can_transition(Planned, Completed));
    }

    #[test]
    fn planned_to_postponed() {
        assert!(can_transition(Planned, Postponed));
    }

    #[test]
    fn planned_to_cancelled() {
        assert!(can_transition(Planned, Cancelled));
    }

    #[test]
    fn in_progress_to_completed() {
        assert!(can_transition(InProgress, Completed));
    }

    #[test]
    fn in_progress_to_postponed() {
        assert!(can_transition(InProgress, Postponed));
    }

    #[test]
    fn in_progress_to_cancelled() {
        assert!(can_transition(InProgress, Cancelled));
    }

    #[test]
    fn postponed_resumes_to_planned() {
        assert!(can_transition(Postponed, Planned));
    }

    #[test]
    fn postponed_to_cancelled() {
        assert!(can_transition(Postponed, Cancelled));
    }

    // -- Terminal states have no outgoing transitions -------------------------

    #[test]
    fn completed_has_no_transitions() {
        assert!(valid_transitions(Completed).is_empty());
    }

    #[test]
    fn cancelled_has_no_transitions() {
        assert!(valid_transitions(Cancelled).is_empty());
    }

    // -- Invalid transitions --------------------------------------------------

    #[test]
    fn completed_to_in_progress_invalid() {
        assert!(!can_transition(Completed, InProgress));
    }

    #[test]
    fn cancelled_to_planned_invalid() {
        assert!(!can_transition(Cancelled, Planned));
    }

    #[test]
    fn postponed_cannot_complete_directly() {
        assert!(!can_transition(Postponed, Completed));
    }

    #[test]
    fn in_progress_cannot_revert_to_planned() {
        assert!(!can_transition(InProgress, Planned));
    }

    #[test]
    fn validate_transition_reports_states() {
        let err = validate_transition(Completed, InProgress).unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition { from: "Completed", to: "InProgress" }
        );
    }

    #[test]
    fn validate_transition_ok() {
        assert!(validate_transition(Planned, InProgress).is_ok());
    }

    // -- validate_completion --------------------------------------------------

    #[test]
    fn completion_requires_actual_hours() {
        assert_matches!(validate_completion(None), Err(CoreError::Validation(_)));
    }

    #[test]
    fn completion_rejects_negative_hours() {
        assert_matches!(validate_completion(Some(-1.0)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn completion_accepts_hours() {
        assert_eq!(validate_completion(Some(3.5)).unwrap(), 3.5);
    }

    // -- validate_schedule ----------------------------------------------------

    #[test]
    fn due_before_planned_rejected() {
        assert_matches!(
            validate_schedule(ts(2024, 6, 10), ts(2024, 6, 1)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn due_on_planned_day_ok() {
        assert!(validate_schedule(ts(2024, 6, 10), ts(2024, 6, 10)).is_ok());
    }

    // -- is_overdue -----------------------------------------------------------

    #[test]
    fn past_due_planned_is_overdue() {
        assert!(is_overdue(Planned, Some(ts(2024, 6, 1)), ts(2024, 6, 2)));
    }

    #[test]
    fn past_due_in_progress_is_overdue() {
        assert!(is_overdue(InProgress, Some(ts(2024, 6, 1)), ts(2024, 6, 2)));
    }

    #[test]
    fn past_due_postponed_is_overdue() {
        // Postponement is a status marker, not a reschedule.
        assert!(is_overdue(Postponed, Some(ts(2024, 6, 1)), ts(2024, 6, 2)));
    }

    #[test]
    fn completed_is_never_overdue() {
        assert!(!is_overdue(Completed, Some(ts(2024, 6, 1)), ts(2024, 6, 2)));
    }

    #[test]
    fn cancelled_is_never_overdue() {
        assert!(!is_overdue(Cancelled, Some(ts(2024, 6, 1)), ts(2024, 6, 2)));
    }

    #[test]
    fn future_due_is_not_overdue() {
        assert!(!is_overdue(Planned, Some(ts(2024, 6, 3)), ts(2024, 6, 2)));
    }

    #[test]
    fn missing_due_date_is_not_overdue() {
        assert!(!is_overdue(Planned, None, ts(2024, 6, 2)));
    }

    // -- is_upcoming ----------------------------------------------------------

    #[test]
    fn upcoming_follows_planned_date_not_due_date() {
        // Planned tomorrow, due well beyond the horizon: still upcoming.
        assert!(is_upcoming(Planned, ts(2024, 6, 2), ts(2024, 6, 1), 30));
    }

    #[test]
    fn planned_beyond_horizon_is_not_upcoming() {
        // Even if its due date were near, a start 40 days out is not upcoming.
        assert!(!is_upcoming(Planned, ts(2024, 7, 11), ts(2024, 6, 1), 30));
    }

    #[test]
    fn already_started_order_is_upcoming() {
        assert!(is_upcoming(InProgress, ts(2024, 5, 20), ts(2024, 6, 1), 30));
    }

    #[test]
    fn terminal_orders_are_not_upcoming() {
        assert!(!is_upcoming(Completed, ts(2024, 6, 2), ts(2024, 6, 1), 30));
        assert!(!is_upcoming(Cancelled, ts(2024, 6, 2), ts(2024, 6, 1), 30));
    }

    // -- parsing --------------------------------------------------------------

    #[test]
    fn status_round_trip() {
        for s in [Planned, InProgress, Completed, Postponed, Cancelled] {
            assert_eq!(WorkOrderStatus::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn overdue_is_not_a_parseable_status() {
        // Overdue is derived, never stored or accepted as input.
        assert_matches!(WorkOrderStatus::parse("Overdue"), Err(CoreError::Validation(_)));
    }
}
