//! Runtime DDL over a storage unit: table and column creation, removal and
//! introspection against the live schema.

use super::TenantStore;
use super::files::finish;
use super::identifier::{TypeAffinity, is_primary_key_name, quote, validate_identifier};
use super::models::{ColumnInfo, ColumnSpec};
use crate::error::TabulaError;
use sqlx::error::DatabaseError;
use sqlx::sqlite::SqliteConnection;
use std::collections::HashSet;
use tracing::{debug, info};

impl TenantStore {
    /// Names of the caller-defined tables in the storage unit.
    pub async fn list_tables(&self, filename: &str) -> Result<Vec<String>, TabulaError> {
        let mut conn = self.files().connect(filename).await?;
        let res = sqlx::query_scalar::<_, String>(
            r"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
        ORDER BY rowid
        ",
        )
        .fetch_all(&mut conn)
        .await
        .map_err(TabulaError::from);
        finish(conn, res).await
    }

    /// Creates `table` with the synthetic `id` key followed by `columns` in order.
    pub async fn create_table(
        &self,
        filename: &str,
        table: &str,
        columns: &[ColumnSpec],
    ) -> Result<(), TabulaError> {
        validate_identifier(table)?;

        let mut seen = HashSet::new();
        let mut defs = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote(super::PRIMARY_KEY)
        )];
        for col in columns {
            validate_identifier(&col.name)?;
            if is_primary_key_name(&col.name) {
                return Err(reserved_key(&col.name));
            }
            if !seen.insert(col.name.to_ascii_lowercase()) {
                return Err(TabulaError::Schema(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
            defs.push(format!("{} {}", quote(&col.name), col.affinity.as_sql()));
        }

        let mut conn = self.files().connect(filename).await?;
        let res: Result<(), TabulaError> = async {
            if table_exists(&mut conn, table).await? {
                return Err(TabulaError::Schema(format!("table '{table}' already exists")));
            }
            let stmt = format!("CREATE TABLE {} ({})", quote(table), defs.join(", "));
            match sqlx::query(&stmt).execute(&mut conn).await {
                Ok(_) => Ok(()),
                // Lost a race with a concurrent create of the same table.
                Err(sqlx::Error::Database(e)) if e.message().contains("already exists") => {
                    Err(TabulaError::Schema(format!("table '{table}' already exists")))
                }
                Err(e) => Err(e.into()),
            }
        }
        .await;
        let res = finish(conn, res).await;

        if res.is_ok() {
            info!(filename, table, columns = columns.len(), "table created");
        }
        res
    }

    /// Drops `table`; an absent table is not an error.
    pub async fn drop_table(&self, filename: &str, table: &str) -> Result<(), TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let stmt = format!("DROP TABLE IF EXISTS {}", quote(table));
        let res = sqlx::query(&stmt)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(TabulaError::from);
        let res = finish(conn, res).await;

        if res.is_ok() {
            info!(filename, table, "table dropped");
        }
        res
    }

    /// Columns of `table` in declaration order, `id` first.
    pub async fn list_columns(
        &self,
        filename: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, TabulaError> {
        validate_identifier(table)?;

        let mut conn = self.files().connect(filename).await?;
        let res = live_columns(&mut conn, table).await;
        finish(conn, res).await
    }

    /// Appends a nullable column; existing rows read it back as NULL.
    pub async fn add_column(
        &self,
        filename: &str,
        table: &str,
        column: &str,
        affinity: TypeAffinity,
    ) -> Result<(), TabulaError> {
        validate_identifier(table)?;
        validate_identifier(column)?;
        if is_primary_key_name(column) {
            return Err(reserved_key(column));
        }

        let mut conn = self.files().connect(filename).await?;
        let res: Result<(), TabulaError> = async {
            let existing = live_columns(&mut conn, table).await?;
            if existing
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(column))
            {
                return Err(TabulaError::Schema(format!(
                    "column '{column}' already exists in '{table}'"
                )));
            }
            let stmt = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote(table),
                quote(column),
                affinity.as_sql()
            );
            sqlx::query(&stmt).execute(&mut conn).await?;
            Ok(())
        }
        .await;
        let res = finish(conn, res).await;

        if res.is_ok() {
            info!(filename, table, column, %affinity, "column added");
        }
        res
    }

    /// Removes `column` from `table`.
    ///
    /// The primary key, and any column SQLite refuses to drop (indexed, referenced
    /// by a constraint, ...), fail with [`TabulaError::ColumnDropUnsupported`].
    /// Busy, locked and I/O failures come back unchanged as [`TabulaError::Database`].
    pub async fn drop_column(
        &self,
        filename: &str,
        table: &str,
        column: &str,
    ) -> Result<(), TabulaError> {
        validate_identifier(table)?;
        validate_identifier(column)?;

        let mut conn = self.files().connect(filename).await?;
        let res: Result<(), TabulaError> = async {
            let existing = live_columns(&mut conn, table).await?;
            let Some(target) = existing
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(column))
            else {
                return Err(TabulaError::Schema(format!(
                    "no such column '{column}' in '{table}'"
                )));
            };
            if target.is_primary_key {
                return Err(TabulaError::ColumnDropUnsupported {
                    table: table.to_string(),
                    column: column.to_string(),
                    reason: "the primary key cannot be dropped".to_string(),
                });
            }

            let stmt = format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote(table),
                quote(column)
            );
            match sqlx::query(&stmt).execute(&mut conn).await {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(e)) if is_refusal(&*e) => {
                    Err(TabulaError::ColumnDropUnsupported {
                        table: table.to_string(),
                        column: column.to_string(),
                        reason: e.message().to_string(),
                    })
                }
                Err(e) => Err(e.into()),
            }
        }
        .await;
        let res = finish(conn, res).await;

        if res.is_ok() {
            info!(filename, table, column, "column dropped");
        }
        res
    }
}

/// SQLite's generic `SQLITE_ERROR` result code, used when it rejects a statement
/// outright. Busy, locked and I/O failures carry other codes.
const SQLITE_ERROR: i32 = 1;

/// True when the engine refused the statement rather than failing to run it.
fn is_refusal(e: &dyn DatabaseError) -> bool {
    e.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == SQLITE_ERROR)
}

fn reserved_key(name: &str) -> TabulaError {
    TabulaError::Schema(format!(
        "column name '{name}' is reserved for the synthetic primary key"
    ))
}

pub(crate) async fn table_exists(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<bool, TabulaError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE)",
    )
    .bind(table)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

/// Reads the live column set of `table`; an empty result means the table is absent.
pub(crate) async fn live_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnInfo>, TabulaError> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table)
            .fetch_all(conn)
            .await?;

    if rows.is_empty() {
        return Err(TabulaError::TableNotFound(table.to_string()));
    }

    debug!(table, columns = rows.len(), "read live schema");
    Ok(rows
        .into_iter()
        .map(|(name, declared, pk)| ColumnInfo {
            name,
            affinity: TypeAffinity::from_declared(&declared),
            is_primary_key: pk > 0,
        })
        .collect())
}
