//! Conversion between JSON row values and SQLite storage values.

use base64::Engine as _;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Row, ValueRef};

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds one JSON value as a statement parameter.
///
/// Arrays and objects are stored as their JSON text.
pub(crate) fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => query.bind(i),
            (None, Some(f)) => query.bind(f),
            (None, None) => query.bind(n.to_string()),
        },
        Value::String(s) => query.bind(s.clone()),
        other @ (Value::Array(_) | Value::Object(_)) => query.bind(other.to_string()),
    }
}

/// Reads column `index` of `row` using the storage class of the stored value.
pub(crate) fn decode_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(i) = row.try_get::<i64, _>(index) {
        return Ok(Value::from(i));
    }
    if let Ok(f) = row.try_get::<f64, _>(index) {
        return Ok(Number::from_f64(f).map_or(Value::Null, Value::Number));
    }
    if let Ok(s) = row.try_get::<String, _>(index) {
        return Ok(Value::String(s));
    }
    let bytes = row.try_get::<Vec<u8>, _>(index)?;
    Ok(Value::String(
        base64::engine::general_purpose::STANDARD.encode(bytes),
    ))
}
