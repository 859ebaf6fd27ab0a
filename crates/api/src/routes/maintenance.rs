//! Maintenance plan and work order routes.
//!
//! Mounted at `/maintenance` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{plans, work_orders};
use crate::state::AppState;

/// ```text
/// GET  /plans                     -> list_plans (?vessel_id, ?equipment_id)
/// POST /plans                     -> create_plan (admin)
/// GET  /plans/{id}                -> get_plan
/// PUT  /plans/{id}                -> update_plan (admin)
/// GET  /work-orders               -> list_orders (?vessel_id, ?status, ?equipment_id)
/// POST /work-orders               -> create_order (admin)
/// GET  /work-orders/overdue       -> overdue_orders (?vessel_id)
/// GET  /work-orders/upcoming      -> upcoming_orders (?vessel_id, ?days)
/// GET  /work-orders/{id}          -> get_order
/// PUT  /work-orders/{id}          -> transition_order
/// GET  /stats                     -> stats (?vessel_id)
/// GET  /calendar                  -> calendar (?year, ?month, ?vessel_id)
/// POST /sweep                     -> trigger_sweep (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(plans::list_plans).post(plans::create_plan))
        .route("/plans/{id}", get(plans::get_plan).put(plans::update_plan))
        .route(
            "/work-orders",
            get(work_orders::list_orders).post(work_orders::create_order),
        )
        .route("/work-orders/overdue", get(work_orders::overdue_orders))
        .route("/work-orders/upcoming", get(work_orders::upcoming_orders))
        .route(
            "/work-orders/{id}",
            get(work_orders::get_order).put(work_orders::transition_order),
        )
        .route("/stats", get(work_orders::stats))
        .route("/calendar", get(work_orders::calendar))
        .route("/sweep", post(work_orders::trigger_sweep))
}
