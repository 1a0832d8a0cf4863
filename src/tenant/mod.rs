//! Per-tenant storage engine: one SQLite file per tenant database, schema and rows
//! defined entirely at runtime.
//!
//! Layout:
//! - `identifier.rs`: identifier grammar and type-affinity vocabulary
//! - `files.rs`: storage unit lifecycle (create/delete/open)
//! - `schema.rs`: dynamic DDL and schema introspection
//! - `rows.rs`: dynamic DML with column filtering
//!
//! Every operation opens its own connection, runs, and closes it. Nothing about a
//! tenant's schema is cached between calls.

pub mod files;
pub mod identifier;
pub mod models;
pub mod rows;
pub mod schema;

mod value;

pub use files::StorageRoot;
pub use identifier::{PRIMARY_KEY, TypeAffinity, validate_identifier};
pub use models::{ColumnInfo, ColumnSpec, Row};

/// Schema and row engine over the storage units of one [`StorageRoot`].
#[derive(Debug, Clone)]
pub struct TenantStore {
    files: StorageRoot,
}

impl TenantStore {
    pub fn new(files: StorageRoot) -> Self {
        Self { files }
    }

    /// Storage unit lifecycle for this store.
    pub fn files(&self) -> &StorageRoot {
        &self.files
    }
}
