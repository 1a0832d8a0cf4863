//! Catalog of tenant databases: maps an owner to its database records.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring catalog rows
//! - `schema.rs`: SQL DDL for initializing the catalog (SQLite)
//! - `actor.rs`: ractor actor owning the catalog pool

pub mod actor;
pub mod models;
pub mod schema;

pub use actor::{CatalogHandle, spawn};
pub use models::{CatalogCreate, DbTenantDatabase};
pub use schema::CATALOG_INIT;
