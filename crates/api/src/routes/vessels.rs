//! Vessel lookup routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::vessels;
use crate::state::AppState;

/// ```text
/// GET /vessels        -> list_vessels
/// GET /vessels/{id}   -> get_vessel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vessels", get(vessels::list_vessels))
        .route("/vessels/{id}", get(vessels::get_vessel))
}
