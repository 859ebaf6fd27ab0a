//! Equipment hierarchy routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::equipment;
use crate::state::AppState;

/// ```text
/// GET    /vessels/{vessel_id}/equipment                 -> list_equipment (?category)
/// GET    /vessels/{vessel_id}/equipment/tree            -> equipment_tree
/// GET    /vessels/{vessel_id}/equipment/status-rollup   -> status_rollup
/// POST   /equipment                                     -> create_equipment (admin)
/// GET    /equipment/{id}                                -> get_equipment
/// PUT    /equipment/{id}                                -> update_equipment (admin)
/// DELETE /equipment/{id}                                -> delete_equipment (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/vessels/{vessel_id}/equipment",
            get(equipment::list_equipment),
        )
        .route(
            "/vessels/{vessel_id}/equipment/tree",
            get(equipment::equipment_tree),
        )
        .route(
            "/vessels/{vessel_id}/equipment/status-rollup",
            get(equipment::status_rollup),
        )
        .route("/equipment", post(equipment::create_equipment))
        .route(
            "/equipment/{id}",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
}
