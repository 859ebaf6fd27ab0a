//! Handlers for the running-hours ledger.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use keelson_core::error::CoreError;
use keelson_core::hierarchy::percent_to_overhaul;
use keelson_core::ledger::{HistoryPoint, HistoryWindow};
use keelson_core::types::DbId;
use keelson_db::models::running_hours::{BulkOutcome, BulkRecordRequest, LatestHoursRow};
use keelson_db::repositories::{EquipmentRepo, RunningHoursRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::identity::ActingUser;
use crate::response::DataResponse;
use crate::services::ledger;
use crate::state::AppState;

/// POST /running-hours/record/bulk -- record one vessel's daily hours.
///
/// Partial success is the norm: rejected entries come back in `errors`
/// while valid ones are committed.
pub async fn record_bulk(
    State(state): State<AppState>,
    user: ActingUser,
    Json(request): Json<BulkRecordRequest>,
) -> AppResult<Json<DataResponse<BulkOutcome>>> {
    let outcome = ledger::record_bulk(
        &state.pool,
        &request,
        user.user_id,
        state.config.sweep.lead_window(),
        state.notifier.as_ref(),
    )
    .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// Query params for the history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Trailing window length in days. Defaults to 30, capped at 365.
    pub days: Option<i64>,
}

/// GET /equipment/{id}/running-hours/history -- zero-filled daily history.
pub async fn history(
    State(state): State<AppState>,
    Path(equipment_id): Path<DbId>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<HistoryPoint>>>> {
    let days = query.days.unwrap_or(30).clamp(1, 365);

    let equipment = EquipmentRepo::get(&state.pool, equipment_id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "equipment",
            id: equipment_id,
        }))?;

    let end = Utc::now().date_naive();
    let start = end - Duration::days(days - 1);

    let baseline = RunningHoursRepo::last_before(&state.pool, equipment_id, start)
        .await?
        .map(|r| r.total_hours)
        .unwrap_or(equipment.initial_running_hours);

    let rows = RunningHoursRepo::list_window(&state.pool, equipment_id, start, end).await?;
    let records = rows
        .into_iter()
        .map(|r| (r.recorded_date, r.daily_hours, r.total_hours))
        .collect();

    let points: Vec<HistoryPoint> = HistoryWindow::new(start, end, baseline, records).collect();
    Ok(Json(DataResponse { data: points }))
}

/// GET /vessels/{vessel_id}/running-hours/latest -- per-equipment latest
/// totals with the overhaul gauge filled in.
pub async fn latest_for_vessel(
    State(state): State<AppState>,
    Path(vessel_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<LatestHoursRow>>>> {
    let mut rows = RunningHoursRepo::latest_for_vessel(&state.pool, vessel_id).await?;
    for row in &mut rows {
        row.percent_to_overhaul = percent_to_overhaul(row.total_hours, row.overhaul_interval_hours);
    }
    Ok(Json(DataResponse { data: rows }))
}
