//! Maintenance plan entity models and DTOs.

use keelson_core::plan::{IntervalUnit, PlanSnapshot};
use keelson_core::types::{DbId, Timestamp};
use keelson_core::error::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `maintenance_plans` table.
///
/// `next_due_date` / `next_due_hours` are derived caches; the scheduler
/// recomputes them from `last_done + interval` on every sweep.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenancePlan {
    pub id: DbId,
    pub equipment_id: DbId,
    pub vessel_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub interval_unit: String,
    pub interval_value: f64,
    pub priority: String,
    pub is_class_related: bool,
    pub estimated_hours: Option<f64>,
    pub last_done_date: Option<Timestamp>,
    pub last_done_hours: Option<f64>,
    pub next_due_date: Option<Timestamp>,
    pub next_due_hours: Option<f64>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MaintenancePlan {
    /// Project the scheduling-relevant slice for the core evaluator.
    pub fn snapshot(&self) -> Result<PlanSnapshot, CoreError> {
        Ok(PlanSnapshot {
            interval_unit: IntervalUnit::parse(&self.interval_unit)?,
            interval_value: self.interval_value,
            last_done_date: self.last_done_date,
            last_done_hours: self.last_done_hours,
            next_due_date: self.next_due_date,
            next_due_hours: self.next_due_hours,
        })
    }
}

/// DTO for `POST /maintenance/plans`.
#[derive(Debug, Deserialize)]
pub struct CreateMaintenancePlan {
    pub equipment_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub interval_unit: String,
    pub interval_value: f64,
    pub priority: Option<String>,
    pub is_class_related: Option<bool>,
    pub estimated_hours: Option<f64>,
    pub last_done_date: Option<Timestamp>,
    pub last_done_hours: Option<f64>,
}

/// DTO for `PUT /maintenance/plans/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMaintenancePlan {
    pub title: Option<String>,
    pub description: Option<String>,
    pub interval_unit: Option<String>,
    pub interval_value: Option<f64>,
    pub priority: Option<String>,
    pub is_class_related: Option<bool>,
    pub estimated_hours: Option<f64>,
    pub last_done_date: Option<Timestamp>,
    pub last_done_hours: Option<f64>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plan(unit: &str) -> MaintenancePlan {
        let now = Utc::now();
        MaintenancePlan {
            id: DbId::from_u128(1),
            equipment_id: DbId::from_u128(2),
            vessel_id: DbId::from_u128(3),
            title: "Main engine overhaul".into(),
            description: None,
            interval_unit: unit.into(),
            interval_value: 6.0,
            priority: "High".into(),
            is_class_related: true,
            estimated_hours: Some(16.0),
            last_done_date: Some(now),
            last_done_hours: Some(12_000.0),
            next_due_date: None,
            next_due_hours: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn snapshot_parses_the_stored_unit() {
        let snap = plan("months").snapshot().unwrap();
        assert_eq!(snap.interval_unit, IntervalUnit::Months);
        assert_eq!(snap.interval_value, 6.0);
    }

    #[test]
    fn snapshot_rejects_unknown_unit() {
        assert!(plan("fortnights").snapshot().is_err());
    }
}
