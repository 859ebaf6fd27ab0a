//! Running-hours ledger routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::running_hours;
use crate::state::AppState;

/// ```text
/// POST /running-hours/record/bulk                  -> record_bulk
/// GET  /equipment/{id}/running-hours/history       -> history (?days)
/// GET  /vessels/{vessel_id}/running-hours/latest   -> latest_for_vessel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/running-hours/record/bulk", post(running_hours::record_bulk))
        .route(
            "/equipment/{id}/running-hours/history",
            get(running_hours::history),
        )
        .route(
            "/vessels/{vessel_id}/running-hours/latest",
            get(running_hours::latest_for_vessel),
        )
}
