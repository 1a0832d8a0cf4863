use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog record for one tenant database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbTenantDatabase {
    pub id: i64,
    pub name: String,
    /// Storage unit key, `{owner_id}_{token}.{ext}`.
    pub filename: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCreate {
    pub name: String,
    pub filename: String,
    pub owner_id: i64,
}
