//! Runtime DML over caller-defined tables. Every call re-reads the live column
//! set and silently drops fields that do not name a column.

use super::TenantStore;
use super::files::finish;
use super::identifier::{quote, validate_identifier};
use super::models::{ColumnInfo, Row};
use super::schema::live_columns;
use super::value::{bind_value, decode_value};
use crate::error::TabulaError;
use serde_json::Value;
use sqlx::{Column, Row as _};
use tracing::debug;

impl TenantStore {
    /// Every row of `table`, ordered by `id` ascending.
    pub async fn get_rows(&self, filename: &str, table: &str) -> Result<Vec<Row>, TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let res: Result<Vec<Row>, TabulaError> = async {
            live_columns(&mut conn, table).await?;

            let stmt = format!(
                "SELECT * FROM {} ORDER BY {}",
                quote(table),
                quote(super::PRIMARY_KEY)
            );
            let rows = sqlx::query(&stmt).fetch_all(&mut conn).await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in &rows {
                let mut mapped = Row::new();
                for (idx, col) in row.columns().iter().enumerate() {
                    mapped.insert(col.name().to_string(), decode_value(row, idx)?);
                }
                out.push(mapped);
            }
            Ok(out)
        }
        .await;
        finish(conn, res).await
    }

    /// Inserts one row built from the fields of `data` that name live columns.
    ///
    /// Unknown fields and `id` are dropped. Empty `data` inserts a row of defaults;
    /// non-empty `data` with nothing left after filtering fails with
    /// [`TabulaError::NoValidColumns`]. Returns the new row's `id`.
    pub async fn add_row(
        &self,
        filename: &str,
        table: &str,
        data: &Row,
    ) -> Result<i64, TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let res: Result<i64, TabulaError> = async {
            let columns = live_columns(&mut conn, table).await?;
            let fields = filter_fields(&columns, data);

            if fields.is_empty() && !data.is_empty() {
                return Err(TabulaError::NoValidColumns);
            }

            let stmt = if fields.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", quote(table))
            } else {
                let names: Vec<String> = fields.iter().map(|(name, _)| quote(name)).collect();
                let placeholders = vec!["?"; fields.len()].join(", ");
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote(table),
                    names.join(", "),
                    placeholders
                )
            };

            let mut query = sqlx::query(&stmt);
            for (_, value) in &fields {
                query = bind_value(query, value);
            }
            let done = query.execute(&mut conn).await?;
            Ok(done.last_insert_rowid())
        }
        .await;
        let res = finish(conn, res).await;

        if let Ok(row_id) = &res {
            debug!(
                filename,
                table,
                row_id,
                supplied = data.len(),
                "row inserted"
            );
        }
        res
    }

    /// Overwrites the recognised fields of the row whose `id` is `row_id`.
    ///
    /// Nothing recognised, or no matching row, is a silent no-op.
    pub async fn update_row(
        &self,
        filename: &str,
        table: &str,
        row_id: i64,
        data: &Row,
    ) -> Result<(), TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let res: Result<(), TabulaError> = async {
            let columns = live_columns(&mut conn, table).await?;
            let fields = filter_fields(&columns, data);

            if fields.is_empty() {
                debug!(filename, table, row_id, "update carried no known columns");
                return Ok(());
            }

            let assignments: Vec<String> = fields
                .iter()
                .map(|(name, _)| format!("{} = ?", quote(name)))
                .collect();
            let stmt = format!(
                "UPDATE {} SET {} WHERE {} = ?",
                quote(table),
                assignments.join(", "),
                quote(super::PRIMARY_KEY)
            );

            let mut query = sqlx::query(&stmt);
            for (_, value) in &fields {
                query = bind_value(query, value);
            }
            let done = query.bind(row_id).execute(&mut conn).await?;
            debug!(
                filename,
                table,
                row_id,
                affected = done.rows_affected(),
                "row updated"
            );
            Ok(())
        }
        .await;
        finish(conn, res).await
    }

    /// Deletes the row whose `id` is `row_id`; a missing row is not an error.
    pub async fn delete_row(
        &self,
        filename: &str,
        table: &str,
        row_id: i64,
    ) -> Result<(), TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let res: Result<(), TabulaError> = async {
            live_columns(&mut conn, table).await?;

            let stmt = format!(
                "DELETE FROM {} WHERE {} = ?",
                quote(table),
                quote(super::PRIMARY_KEY)
            );
            let done = sqlx::query(&stmt).bind(row_id).execute(&mut conn).await?;
            debug!(
                filename,
                table,
                row_id,
                affected = done.rows_affected(),
                "row deleted"
            );
            Ok(())
        }
        .await;
        finish(conn, res).await
    }
}

/// Keeps the fields of `data` that exactly name a live, non-key column.
fn filter_fields<'a>(columns: &[ColumnInfo], data: &'a Row) -> Vec<(&'a str, &'a Value)> {
    data.iter()
        .filter(|(name, _)| {
            columns
                .iter()
                .any(|c| !c.is_primary_key && c.name == name.as_str())
        })
        .filter(|(name, _)| validate_identifier(name).is_ok())
        .map(|(name, value)| (name.as_str(), value))
        .collect()
}
