pub mod databases;

pub use databases::{DatabaseService, ReconcileReport};
