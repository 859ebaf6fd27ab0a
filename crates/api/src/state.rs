use std::sync::Arc;

use crate::background::sweep::SweepHealth;
use crate::config::ServerConfig;
use crate::services::notify::Notifier;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: keelson_db::DbPool,
    /// Server configuration (sweep policy, timeouts).
    pub config: Arc<ServerConfig>,
    /// Work order notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Liveness record of the background sweep, for the health endpoint.
    pub sweep_health: Arc<SweepHealth>,
}
