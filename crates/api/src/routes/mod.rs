//! Route definitions, grouped by resource.

pub mod equipment;
pub mod health;
pub mod maintenance;
pub mod running_hours;
pub mod vessels;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /vessels                                         list
/// /vessels/{id}                                    get
/// /vessels/{vessel_id}/equipment                   flat list (?category)
/// /vessels/{vessel_id}/equipment/tree              nested forest
/// /vessels/{vessel_id}/equipment/status-rollup     dashboard counts
/// /vessels/{vessel_id}/running-hours/latest        latest totals
///
/// /equipment                                       create (admin)
/// /equipment/{id}                                  get, update, delete
/// /equipment/{id}/running-hours/history            daily history (?days)
///
/// /running-hours/record/bulk                       bulk daily recording
///
/// /maintenance/plans                               list, create (admin)
/// /maintenance/plans/{id}                          get, update (admin)
/// /maintenance/work-orders                         list, create (admin)
/// /maintenance/work-orders/{id}                    get, transition
/// /maintenance/work-orders/overdue                 past-due open orders
/// /maintenance/work-orders/upcoming                planned soon (?days)
/// /maintenance/stats                               counts + completion rate
/// /maintenance/calendar                            month view (?year&month)
/// /maintenance/sweep                               manual sweep (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(vessels::router())
        .merge(equipment::router())
        .merge(running_hours::router())
        .nest("/maintenance", maintenance::router())
}
