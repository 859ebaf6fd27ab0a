//! Repository for the `vessels` table (read-only surface).

use keelson_core::types::DbId;
use sqlx::PgPool;

use crate::models::vessel::Vessel;

/// Column list for `vessels` queries.
const COLUMNS: &str = "\
    id, name, imo_number, vessel_type, flag, class_society, \
    is_active, created_at, updated_at";

/// Read access to vessels for scoping and dashboards.
pub struct VesselRepo;

impl VesselRepo {
    /// List active vessels ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Vessel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vessels WHERE is_active ORDER BY name ASC");
        sqlx::query_as::<_, Vessel>(&query).fetch_all(pool).await
    }

    /// Fetch one vessel by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Vessel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vessels WHERE id = $1");
        sqlx::query_as::<_, Vessel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Cheap existence probe for referential validation.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let found: Option<(DbId,)> = sqlx::query_as("SELECT id FROM vessels WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }
}
