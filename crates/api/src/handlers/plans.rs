//! Handlers for maintenance plans.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use keelson_core::error::CoreError;
use keelson_core::plan::{validate_interval, IntervalUnit, Priority};
use keelson_core::types::DbId;
use keelson_db::models::maintenance_plan::{
    CreateMaintenancePlan, MaintenancePlan, UpdateMaintenancePlan,
};
use keelson_db::repositories::{EquipmentRepo, MaintenancePlanRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::identity::ActingUser;
use crate::response::DataResponse;
use crate::services::scheduler;
use crate::state::AppState;

/// Query params for `GET /maintenance/plans`.
#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    pub vessel_id: Option<DbId>,
    pub equipment_id: Option<DbId>,
}

/// GET /maintenance/plans -- list active plans, nearest due first.
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<DataResponse<Vec<MaintenancePlan>>>> {
    let plans = MaintenancePlanRepo::list(&state.pool, query.vessel_id, query.equipment_id).await?;
    Ok(Json(DataResponse { data: plans }))
}

/// GET /maintenance/plans/{id} -- fetch one plan.
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaintenancePlan>>> {
    let plan = fetch(&state, id).await?;
    Ok(Json(DataResponse { data: plan }))
}

/// POST /maintenance/plans -- create a plan (admin).
///
/// The schedule is evaluated immediately so the next-due cache is filled
/// without waiting for the next sweep tick.
pub async fn create_plan(
    State(state): State<AppState>,
    user: ActingUser,
    Json(input): Json<CreateMaintenancePlan>,
) -> AppResult<Json<DataResponse<MaintenancePlan>>> {
    user.require_admin()?;

    let unit = IntervalUnit::parse(&input.interval_unit)?;
    validate_interval(unit, input.interval_value)?;
    if let Some(priority) = &input.priority {
        Priority::parse(priority)?;
    }
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "title must not be empty".to_string(),
        )));
    }

    let equipment = EquipmentRepo::get(&state.pool, input.equipment_id)
        .await?
        .filter(|e| e.is_active)
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "equipment",
            id: input.equipment_id,
        }))?;

    let created = MaintenancePlanRepo::insert(&state.pool, equipment.vessel_id, &input).await?;
    tracing::info!(plan_id = %created.id, equipment_id = %equipment.id, "Maintenance plan created");

    scheduler::sweep_one(
        &state.pool,
        &created,
        Utc::now(),
        state.config.sweep.lead_window(),
        state.notifier.as_ref(),
    )
    .await?;

    // Re-read to pick up the cache the sweep just wrote.
    let plan = fetch(&state, created.id).await?;
    Ok(Json(DataResponse { data: plan }))
}

/// PUT /maintenance/plans/{id} -- patch a plan (admin). Interval changes
/// are validated against the merged unit/value pair and re-evaluated.
pub async fn update_plan(
    State(state): State<AppState>,
    user: ActingUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaintenancePlan>,
) -> AppResult<Json<DataResponse<MaintenancePlan>>> {
    user.require_admin()?;

    let current = fetch(&state, id).await?;

    if input.interval_unit.is_some() || input.interval_value.is_some() {
        let unit = IntervalUnit::parse(
            input
                .interval_unit
                .as_deref()
                .unwrap_or(&current.interval_unit),
        )?;
        let value = input.interval_value.unwrap_or(current.interval_value);
        validate_interval(unit, value)?;
    }
    if let Some(priority) = &input.priority {
        Priority::parse(priority)?;
    }

    let updated = MaintenancePlanRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "maintenance_plan",
            id,
        }))?;

    if updated.is_active {
        scheduler::sweep_one(
            &state.pool,
            &updated,
            Utc::now(),
            state.config.sweep.lead_window(),
            state.notifier.as_ref(),
        )
        .await?;
    }

    let plan = fetch(&state, id).await?;
    Ok(Json(DataResponse { data: plan }))
}

async fn fetch(state: &AppState, id: DbId) -> AppResult<MaintenancePlan> {
    MaintenancePlanRepo::get(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "maintenance_plan",
            id,
        }))
}
