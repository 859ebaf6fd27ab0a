//! Vessel entity. The engine only reads vessels (scoping, dashboards);
//! fleet administration lives outside this service.

use keelson_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `vessels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vessel {
    pub id: DbId,
    pub name: String,
    pub imo_number: Option<String>,
    pub vessel_type: String,
    pub flag: Option<String>,
    pub class_society: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
