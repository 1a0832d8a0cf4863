use crate::error::TabulaError;
use crate::server::guards::auth::Tenant;
use crate::server::router::TabulaState;
use crate::tenant::Row;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// GET /databases/{db_id}/tables/{table}/rows?offset&limit
///
/// Paging is applied here over the whole-table read.
pub async fn get_rows(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table)): Path<(i64, String)>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Row>>, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    let rows = state.databases.store().get_rows(&db.filename, &table).await?;

    let rows = rows
        .into_iter()
        .skip(page.offset.unwrap_or(0))
        .take(page.limit.unwrap_or(usize::MAX))
        .collect();
    Ok(Json(rows))
}

/// POST /databases/{db_id}/tables/{table}/rows
pub async fn add_row(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table)): Path<(i64, String)>,
    Json(data): Json<Row>,
) -> Result<(StatusCode, Json<Value>), TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    let id = state
        .databases
        .store()
        .add_row(&db.filename, &table, &data)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /databases/{db_id}/tables/{table}/rows/{row_id}
pub async fn update_row(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table, row_id)): Path<(i64, String, i64)>,
    Json(data): Json<Row>,
) -> Result<StatusCode, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state
        .databases
        .store()
        .update_row(&db.filename, &table, row_id, &data)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /databases/{db_id}/tables/{table}/rows/{row_id}
pub async fn delete_row(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table, row_id)): Path<(i64, String, i64)>,
) -> Result<StatusCode, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state
        .databases
        .store()
        .delete_row(&db.filename, &table, row_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
