use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum TabulaError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Could not drop column '{column}' from '{table}': {reason}")]
    ColumnDropUnsupported {
        table: String,
        column: String,
        reason: String,
    },

    #[error("No valid columns provided")]
    NoValidColumns,

    #[error("Invalid storage key: {0}")]
    InvalidStorageKey(String),

    #[error("Database {0} not found")]
    DatabaseNotFound(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TabulaError {
    /// HTTP status the calling layer answers with for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TabulaError::InvalidIdentifier(_)
            | TabulaError::Schema(_)
            | TabulaError::NoValidColumns
            | TabulaError::InvalidStorageKey(_)
            | TabulaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TabulaError::TableNotFound(_) | TabulaError::DatabaseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            TabulaError::ColumnDropUnsupported { .. } | TabulaError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            TabulaError::RactorError(_)
            | TabulaError::Database(_)
            | TabulaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TabulaError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            TabulaError::Schema(_) => "SCHEMA_ERROR",
            TabulaError::TableNotFound(_) => "TABLE_NOT_FOUND",
            TabulaError::ColumnDropUnsupported { .. } => "COLUMN_DROP_UNSUPPORTED",
            TabulaError::NoValidColumns => "NO_VALID_COLUMNS",
            TabulaError::InvalidStorageKey(_) => "INVALID_STORAGE_KEY",
            TabulaError::DatabaseNotFound(_) => "DATABASE_NOT_FOUND",
            TabulaError::Conflict(_) => "CONFLICT",
            TabulaError::InvalidRequest(_) => "INVALID_REQUEST",
            TabulaError::RactorError(_)
            | TabulaError::Database(_)
            | TabulaError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for TabulaError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!(error = %self, "request failed with internal error");
            ApiErrorObject {
                code: self.code().to_string(),
                message: "An internal server error occurred.".to_string(),
                details: None,
            }
        } else {
            let details = match &self {
                TabulaError::ColumnDropUnsupported { table, column, .. } => {
                    Some(json!({ "table": table, "column": column }))
                }
                TabulaError::TableNotFound(table) => Some(json!({ "table": table })),
                _ => None,
            };
            ApiErrorObject {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            }
        };
        (status, Json(ApiErrorBody { inner: body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_taxonomy_maps_to_distinct_statuses() {
        assert_eq!(
            TabulaError::InvalidIdentifier("1abc".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TabulaError::TableNotFound("t1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TabulaError::ColumnDropUnsupported {
                table: "t1".into(),
                column: "id".into(),
                reason: "primary key".into(),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            TabulaError::NoValidColumns.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TabulaError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_engine_text() {
        let resp = TabulaError::RactorError("mailbox closed".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
