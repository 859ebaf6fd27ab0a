use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use keelson_core::types::Timestamp;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the background sweep completed a pass recently.
    pub sweep_healthy: bool,
    /// When the sweep last completed a pass, if it has run at all.
    pub last_sweep_at: Option<Timestamp>,
}

/// GET /health -- database reachability plus sweep liveness. A stuck
/// sweep degrades the service even while requests are still served.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = keelson_db::health_check(&state.pool).await.is_ok();

    let now = Utc::now();
    let sweep_healthy = state
        .sweep_health
        .is_alive(now, state.config.sweep.interval_secs);

    let status = if db_healthy && sweep_healthy {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        sweep_healthy,
        last_sweep_at: state.sweep_health.last_pass(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
