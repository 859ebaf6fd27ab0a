//! Handlers for the equipment hierarchy.
//!
//! Tree and rollup endpoints derive status at read time from the ledger
//! projection; mutation endpoints are admin-only and run the core cycle
//! checks before anything is written.

use axum::extract::{Path, Query, State};
use axum::Json;
use keelson_core::error::CoreError;
use keelson_core::hierarchy::{
    aggregate_status, build_forest, collect_subtree, validate_reparent, EquipmentCategory,
    EquipmentItem, EquipmentNode, StatusRollup,
};
use keelson_core::types::DbId;
use keelson_db::models::equipment::{CreateEquipment, Equipment, UpdateEquipment};
use keelson_db::repositories::{EquipmentRepo, VesselRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::identity::ActingUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query params for equipment listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    pub category: Option<String>,
}

/// Project database rows into the core tree-building input.
fn to_items(rows: &[Equipment]) -> Vec<EquipmentItem> {
    rows.iter()
        .map(|e| EquipmentItem {
            id: e.id,
            parent_id: e.parent_id,
            equipment_code: e.equipment_code.clone(),
            name: e.name.clone(),
            category: EquipmentCategory::parse_lossy(&e.category),
            sort_order: e.sort_order,
            current_running_hours: e.current_running_hours,
            overhaul_interval_hours: e.overhaul_interval_hours,
        })
        .collect()
}

/// GET /vessels/{vessel_id}/equipment -- flat list, optional ?category=.
pub async fn list_equipment(
    State(state): State<AppState>,
    Path(vessel_id): Path<DbId>,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<DataResponse<Vec<Equipment>>>> {
    let rows =
        EquipmentRepo::list_by_vessel(&state.pool, vessel_id, query.category.as_deref()).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /vessels/{vessel_id}/equipment/tree -- nested forest with derived
/// status per node.
pub async fn equipment_tree(
    State(state): State<AppState>,
    Path(vessel_id): Path<DbId>,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<DataResponse<Vec<EquipmentNode>>>> {
    let rows =
        EquipmentRepo::list_by_vessel(&state.pool, vessel_id, query.category.as_deref()).await?;
    let forest = build_forest(&to_items(&rows))?;
    Ok(Json(DataResponse { data: forest }))
}

/// GET /vessels/{vessel_id}/equipment/status-rollup -- dashboard counts.
pub async fn status_rollup(
    State(state): State<AppState>,
    Path(vessel_id): Path<DbId>,
) -> AppResult<Json<DataResponse<StatusRollup>>> {
    let rows = EquipmentRepo::list_by_vessel(&state.pool, vessel_id, None).await?;
    let forest = build_forest(&to_items(&rows))?;
    Ok(Json(DataResponse {
        data: aggregate_status(&forest),
    }))
}

/// GET /equipment/{id} -- fetch one equipment row.
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Equipment>>> {
    let equipment = fetch(&state, id).await?;
    Ok(Json(DataResponse { data: equipment }))
}

/// POST /equipment -- register equipment (admin).
pub async fn create_equipment(
    State(state): State<AppState>,
    user: ActingUser,
    Json(input): Json<CreateEquipment>,
) -> AppResult<Json<DataResponse<Equipment>>> {
    user.require_admin()?;

    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "name must not be empty".to_string(),
        )));
    }
    if let Some(initial) = input.initial_running_hours {
        if !initial.is_finite() || initial < 0.0 {
            return Err(AppError::Core(CoreError::Validation(
                "initial_running_hours must be >= 0".to_string(),
            )));
        }
    }
    if !VesselRepo::exists(&state.pool, input.vessel_id).await? {
        return Err(AppError::Core(CoreError::Referential {
            entity: "vessel",
            id: input.vessel_id,
        }));
    }
    if let Some(parent_id) = input.parent_id {
        let parent = fetch(&state, parent_id).await?;
        if parent.vessel_id != input.vessel_id || !parent.is_active {
            return Err(AppError::Core(CoreError::Referential {
                entity: "equipment",
                id: parent_id,
            }));
        }
    }

    let created = EquipmentRepo::insert(&state.pool, &input).await?;
    tracing::info!(equipment_id = %created.id, code = %created.equipment_code, "Equipment registered");
    Ok(Json(DataResponse { data: created }))
}

/// PUT /equipment/{id} -- patch static fields (admin). A parent change is
/// validated against the whole vessel forest before the write.
pub async fn update_equipment(
    State(state): State<AppState>,
    user: ActingUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEquipment>,
) -> AppResult<Json<DataResponse<Equipment>>> {
    user.require_admin()?;

    let current = fetch(&state, id).await?;

    if let Some(new_parent) = input.parent_id {
        if Some(new_parent) != current.parent_id {
            let rows = EquipmentRepo::list_by_vessel(&state.pool, current.vessel_id, None).await?;
            validate_reparent(&to_items(&rows), id, new_parent)?;
        }
    }
    if let Some(interval) = input.overhaul_interval_hours {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(AppError::Core(CoreError::Validation(
                "overhaul_interval_hours must be positive".to_string(),
            )));
        }
    }

    let updated = EquipmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "equipment",
            id,
        }))?;
    Ok(Json(DataResponse { data: updated }))
}

/// Payload for a cascading soft delete.
#[derive(Debug, Serialize)]
pub struct DeactivateResult {
    pub deactivated: u64,
}

/// DELETE /equipment/{id} -- soft-delete a node and its subtree (admin).
pub async fn delete_equipment(
    State(state): State<AppState>,
    user: ActingUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeactivateResult>>> {
    user.require_admin()?;

    let target = fetch(&state, id).await?;
    let rows = EquipmentRepo::list_by_vessel(&state.pool, target.vessel_id, None).await?;
    let subtree = collect_subtree(&to_items(&rows), id);

    let deactivated = EquipmentRepo::deactivate_many(&state.pool, &subtree).await?;
    tracing::info!(equipment_id = %id, deactivated, "Equipment subtree deactivated");
    Ok(Json(DataResponse {
        data: DeactivateResult { deactivated },
    }))
}

async fn fetch(state: &AppState, id: DbId) -> AppResult<Equipment> {
    EquipmentRepo::get(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "equipment",
            id,
        }))
}
