use crate::server::router::TabulaState;
use axum::{
    Router,
    routing::{delete, get, put},
};

pub mod databases;
pub mod rows;
pub mod tables;

pub fn router() -> Router<TabulaState> {
    Router::new()
        .route(
            "/databases",
            get(databases::list_databases).post(databases::create_database),
        )
        .route(
            "/databases/{db_id}",
            get(databases::get_database).delete(databases::delete_database),
        )
        .route(
            "/databases/{db_id}/tables",
            get(tables::list_tables).post(tables::create_table),
        )
        .route(
            "/databases/{db_id}/tables/{table}",
            delete(tables::drop_table),
        )
        .route(
            "/databases/{db_id}/tables/{table}/columns",
            get(tables::list_columns).post(tables::add_column),
        )
        .route(
            "/databases/{db_id}/tables/{table}/columns/{column}",
            delete(tables::drop_column),
        )
        .route(
            "/databases/{db_id}/tables/{table}/rows",
            get(rows::get_rows).post(rows::add_row),
        )
        .route(
            "/databases/{db_id}/tables/{table}/rows/{row_id}",
            put(rows::update_row).delete(rows::delete_row),
        )
}
