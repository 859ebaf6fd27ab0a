//! Handlers for work orders, stats, the calendar, and the manual sweep.
//!
//! Every list response carries the derived `is_overdue` flag evaluated
//! against the live clock; "Overdue" never appears as a stored status.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use keelson_core::error::CoreError;
use keelson_core::stats::{compute_stats, WorkOrderStats};
use keelson_core::types::{DbId, Timestamp};
use keelson_core::work_order::{is_upcoming, validate_schedule, WorkOrderStatus};
use keelson_db::models::work_order::{
    CreateWorkOrder, TransitionWorkOrder, WorkOrderFilter, WorkOrderView,
};
use keelson_db::repositories::{EquipmentRepo, WorkOrderRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::identity::ActingUser;
use crate::response::DataResponse;
use crate::services::{lifecycle, scheduler};
use crate::state::AppState;

/// GET /maintenance/work-orders -- filterable list with derived overdue.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<WorkOrderFilter>,
) -> AppResult<Json<DataResponse<Vec<WorkOrderView>>>> {
    if let Some(status) = &filter.status {
        // Reject unknown filter values up front, including "Overdue".
        WorkOrderStatus::parse(status)?;
    }
    let now = Utc::now();
    let orders = WorkOrderRepo::list(&state.pool, &filter).await?;
    let views = orders
        .into_iter()
        .map(|o| WorkOrderView::at(o, now))
        .collect();
    Ok(Json(DataResponse { data: views }))
}

/// GET /maintenance/work-orders/{id} -- fetch one order.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorkOrderView>>> {
    let order = WorkOrderRepo::get(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "work_order",
            id,
        }))?;
    Ok(Json(DataResponse {
        data: WorkOrderView::now(order),
    }))
}

/// POST /maintenance/work-orders -- create an ad-hoc order (admin).
pub async fn create_order(
    State(state): State<AppState>,
    user: ActingUser,
    Json(input): Json<CreateWorkOrder>,
) -> AppResult<Json<DataResponse<WorkOrderView>>> {
    user.require_admin()?;

    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "title must not be empty".to_string(),
        )));
    }
    validate_schedule(input.planned_date, input.due_date)?;
    if let Some(priority) = &input.priority {
        keelson_core::plan::Priority::parse(priority)?;
    }

    let equipment = EquipmentRepo::get(&state.pool, input.equipment_id)
        .await?
        .filter(|e| e.is_active)
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "equipment",
            id: input.equipment_id,
        }))?;

    let created = WorkOrderRepo::insert(&state.pool, equipment.vessel_id, None, &input).await?;
    state.notifier.notify_created(&created);
    Ok(Json(DataResponse {
        data: WorkOrderView::now(created),
    }))
}

/// PUT /maintenance/work-orders/{id} -- apply a status transition.
pub async fn transition_order(
    State(state): State<AppState>,
    user: ActingUser,
    Path(id): Path<DbId>,
    Json(input): Json<TransitionWorkOrder>,
) -> AppResult<Json<DataResponse<WorkOrderView>>> {
    let updated = lifecycle::transition(
        &state.pool,
        id,
        &input,
        user.user_id,
        state.config.sweep.lead_window(),
        state.notifier.as_ref(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: WorkOrderView::now(updated),
    }))
}

/// Vessel scope for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub vessel_id: Option<DbId>,
}

/// GET /maintenance/work-orders/overdue -- past-due open orders.
pub async fn overdue_orders(
    State(state): State<AppState>,
    Query(scope): Query<ScopeQuery>,
) -> AppResult<Json<DataResponse<Vec<WorkOrderView>>>> {
    let now = Utc::now();
    let orders = WorkOrderRepo::list_overdue(&state.pool, scope.vessel_id, now).await?;
    let views = orders
        .into_iter()
        .map(|o| WorkOrderView::at(o, now))
        .collect();
    Ok(Json(DataResponse { data: views }))
}

/// Query params for `GET /maintenance/work-orders/upcoming`.
#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub vessel_id: Option<DbId>,
    /// Horizon in days. Defaults to 30, capped at 365.
    pub days: Option<i64>,
}

/// GET /maintenance/work-orders/upcoming -- open orders planned to start
/// within the horizon.
pub async fn upcoming_orders(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<Json<DataResponse<Vec<WorkOrderView>>>> {
    let now = Utc::now();
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let orders = WorkOrderRepo::list_upcoming(&state.pool, query.vessel_id, now, days).await?;
    let views = orders
        .into_iter()
        .filter(|o| match o.status_enum() {
            Ok(status) => is_upcoming(status, o.planned_date, now, days),
            Err(_) => false,
        })
        .map(|o| WorkOrderView::at(o, now))
        .collect();
    Ok(Json(DataResponse { data: views }))
}

/// GET /maintenance/stats -- work order counts and completion rate.
pub async fn stats(
    State(state): State<AppState>,
    Query(scope): Query<ScopeQuery>,
) -> AppResult<Json<DataResponse<WorkOrderStats>>> {
    let now = Utc::now();
    let rows = WorkOrderRepo::list_snapshot(&state.pool, scope.vessel_id).await?;

    let snapshots = rows.iter().filter_map(|row| {
        match WorkOrderStatus::parse(&row.status) {
            Ok(status) => Some((status, Some(row.due_date))),
            Err(_) => {
                tracing::warn!(status = %row.status, "Ignoring order with unknown status in stats");
                None
            }
        }
    });

    Ok(Json(DataResponse {
        data: compute_stats(snapshots, now),
    }))
}

/// Query params for `GET /maintenance/calendar`.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    pub vessel_id: Option<DbId>,
}

/// One calendar entry: orders grouped by their planned day.
#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub orders: Vec<WorkOrderView>,
}

/// GET /maintenance/calendar -- month view of planned work orders.
pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<DataResponse<Vec<CalendarDay>>>> {
    let (start, end) = month_bounds(query.year, query.month).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "invalid calendar month: {}-{:02}",
            query.year, query.month
        )))
    })?;

    let orders = WorkOrderRepo::list_in_range(&state.pool, query.vessel_id, start, end).await?;
    Ok(Json(DataResponse {
        data: group_by_planned_day(orders, Utc::now()),
    }))
}

/// Bucket orders by the calendar day they are planned to start.
fn group_by_planned_day(
    orders: Vec<keelson_db::models::work_order::WorkOrder>,
    now: Timestamp,
) -> Vec<CalendarDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<WorkOrderView>> = BTreeMap::new();
    for order in orders {
        let day = order.planned_date.date_naive();
        by_day.entry(day).or_default().push(WorkOrderView::at(order, now));
    }
    by_day
        .into_iter()
        .map(|(date, orders)| CalendarDay { date, orders })
        .collect()
}

/// Inclusive timestamp bounds of one calendar month.
fn month_bounds(year: i32, month: u32) -> Option<(Timestamp, Timestamp)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?);
    let end = Utc.from_utc_datetime(&next_month.and_hms_opt(0, 0, 0)?) - Duration::nanoseconds(1);
    Some((start, end))
}

/// POST /maintenance/sweep -- run a full sweep pass now (admin).
pub async fn trigger_sweep(
    State(state): State<AppState>,
    user: ActingUser,
) -> AppResult<Json<DataResponse<scheduler::SweepSummary>>> {
    user.require_admin()?;
    let summary = scheduler::sweep_all(
        &state.pool,
        Utc::now(),
        state.config.sweep.lead_window(),
        state.notifier.as_ref(),
    )
    .await?;
    Ok(Json(DataResponse { data: summary }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_db::models::work_order::WorkOrder;

    fn order(title: &str, planned: Timestamp, due: Timestamp) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: DbId::new_v4(),
            plan_id: None,
            equipment_id: DbId::from_u128(2),
            vessel_id: DbId::from_u128(3),
            title: title.into(),
            description: None,
            status: "Planned".into(),
            priority: "Medium".into(),
            is_class_related: false,
            planned_date: planned,
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
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn calendar_groups_on_planned_day() {
        // Due dates land in later months; the calendar buckets by when the
        // work is planned to start.
        let orders = vec![
            order("Bilge pump check", ts(2024, 6, 3), ts(2024, 7, 20)),
            order("Oil change", ts(2024, 6, 3), ts(2024, 6, 10)),
            order("Hull inspection", ts(2024, 6, 15), ts(2024, 8, 1)),
        ];
        let days = group_by_planned_day(orders, ts(2024, 6, 1));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(days[0].orders.len(), 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(days[1].orders[0].order.title, "Hull inspection");
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        // Leap year February runs through the 29th.
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (_, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn invalid_month_rejected() {
        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }
}
