use crate::error::TabulaError;
use crate::server::guards::auth::Tenant;
use crate::server::router::TabulaState;
use crate::tenant::{ColumnInfo, ColumnSpec};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

/// GET /databases/{db_id}/tables
pub async fn list_tables(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path(db_id): Path<i64>,
) -> Result<Json<Vec<String>>, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    let tables = state.databases.store().list_tables(&db.filename).await?;
    Ok(Json(tables))
}

/// POST /databases/{db_id}/tables
pub async fn create_table(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path(db_id): Path<i64>,
    Json(body): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<Value>), TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state
        .databases
        .store()
        .create_table(&db.filename, &body.name, &body.columns)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "name": body.name }))))
}

/// DELETE /databases/{db_id}/tables/{table}
pub async fn drop_table(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table)): Path<(i64, String)>,
) -> Result<StatusCode, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state.databases.store().drop_table(&db.filename, &table).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /databases/{db_id}/tables/{table}/columns
pub async fn list_columns(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table)): Path<(i64, String)>,
) -> Result<Json<Vec<ColumnInfo>>, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    let columns = state
        .databases
        .store()
        .list_columns(&db.filename, &table)
        .await?;
    Ok(Json(columns))
}

/// POST /databases/{db_id}/tables/{table}/columns
pub async fn add_column(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table)): Path<(i64, String)>,
    Json(column): Json<ColumnSpec>,
) -> Result<(StatusCode, Json<ColumnSpec>), TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state
        .databases
        .store()
        .add_column(&db.filename, &table, &column.name, column.affinity)
        .await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// DELETE /databases/{db_id}/tables/{table}/columns/{column}
pub async fn drop_column(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path((db_id, table, column)): Path<(i64, String, String)>,
) -> Result<StatusCode, TabulaError> {
    let db = state.databases.resolve(owner_id, db_id).await?;
    state
        .databases
        .store()
        .drop_column(&db.filename, &table, &column)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
