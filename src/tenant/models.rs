use super::identifier::TypeAffinity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row: column name to value, in column order, always including `id`.
pub type Row = Map<String, Value>;

/// Caller-supplied column definition for `create_table` and `add_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Missing or unknown types fall back to `TEXT`.
    #[serde(rename = "type", default)]
    pub affinity: TypeAffinity,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, affinity: TypeAffinity) -> Self {
        Self {
            name: name.into(),
            affinity,
        }
    }
}

/// A column as it currently exists in the live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub affinity: TypeAffinity,
    pub is_primary_key: bool,
}
