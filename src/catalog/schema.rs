//! SQL DDL for initializing the tenant database catalog.

/// SQLite schema includes:
/// - `tenant_databases` table (one row per tenant database, one storage unit per row)
pub const CATALOG_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Tenant databases (one (owner_id, name) per row, filename globally unique)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tenant_databases (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    filename TEXT NOT NULL UNIQUE,
    owner_id INTEGER NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    UNIQUE(owner_id, name)
);

CREATE INDEX IF NOT EXISTS idx_tenant_databases_owner ON tenant_databases(owner_id);
"#;
