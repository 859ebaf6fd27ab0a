//! Equipment entity models and DTOs.

use keelson_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `equipment` table.
///
/// `current_running_hours` and `status` are materialized projections owned
/// by the running-hours ledger; nothing else writes them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: DbId,
    pub vessel_id: DbId,
    pub parent_id: Option<DbId>,
    pub equipment_code: String,
    pub name: String,
    pub category: String,
    pub maker: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub initial_running_hours: f64,
    pub current_running_hours: f64,
    pub overhaul_interval_hours: Option<f64>,
    pub status: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering equipment via `POST /equipment`.
#[derive(Debug, Deserialize)]
pub struct CreateEquipment {
    pub vessel_id: DbId,
    pub parent_id: Option<DbId>,
    pub equipment_code: String,
    pub name: String,
    pub category: String,
    pub maker: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub initial_running_hours: Option<f64>,
    pub overhaul_interval_hours: Option<f64>,
    pub sort_order: Option<i32>,
}

/// DTO for patching equipment via `PUT /equipment/{id}`.
///
/// Running hours are deliberately absent: the ledger is the sole writer of
/// `current_running_hours`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEquipment {
    pub parent_id: Option<DbId>,
    pub equipment_code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub maker: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub overhaul_interval_hours: Option<f64>,
    pub sort_order: Option<i32>,
}
