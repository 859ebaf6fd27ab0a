//! Handlers for vessel lookups.

use axum::extract::{Path, State};
use axum::Json;
use keelson_core::error::CoreError;
use keelson_core::types::DbId;
use keelson_db::models::vessel::Vessel;
use keelson_db::repositories::VesselRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /vessels -- list active vessels.
pub async fn list_vessels(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Vessel>>>> {
    let vessels = VesselRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: vessels }))
}

/// GET /vessels/{id} -- fetch one vessel.
pub async fn get_vessel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vessel>>> {
    let vessel = VesselRepo::get(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::Referential {
            entity: "vessel",
            id,
        }))?;
    Ok(Json(DataResponse { data: vessel }))
}
