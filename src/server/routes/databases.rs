use crate::catalog::DbTenantDatabase;
use crate::error::TabulaError;
use crate::server::guards::auth::Tenant;
use crate::server::router::TabulaState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateDatabaseRequest {
    pub name: String,
}

/// GET /databases
pub async fn list_databases(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
) -> Result<Json<Vec<DbTenantDatabase>>, TabulaError> {
    Ok(Json(state.databases.list_databases(owner_id).await?))
}

/// POST /databases
pub async fn create_database(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Json(body): Json<CreateDatabaseRequest>,
) -> Result<(StatusCode, Json<DbTenantDatabase>), TabulaError> {
    let record = state
        .databases
        .create_database(owner_id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /databases/{db_id}
pub async fn get_database(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path(db_id): Path<i64>,
) -> Result<Json<DbTenantDatabase>, TabulaError> {
    Ok(Json(state.databases.resolve(owner_id, db_id).await?))
}

/// DELETE /databases/{db_id}
pub async fn delete_database(
    State(state): State<TabulaState>,
    Tenant(owner_id): Tenant,
    Path(db_id): Path<i64>,
) -> Result<StatusCode, TabulaError> {
    state.databases.delete_database(owner_id, db_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
