pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod tenant;

pub use error::TabulaError;
pub use service::DatabaseService;
pub use tenant::{ColumnInfo, ColumnSpec, Row, StorageRoot, TenantStore, TypeAffinity};
