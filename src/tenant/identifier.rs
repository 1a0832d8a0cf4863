//! Identifier grammar and type-affinity vocabulary shared by the schema and row engines.
//!
//! Identifiers cannot be bound as statement parameters, so every table and column
//! name is checked against `[A-Za-z_][A-Za-z0-9_]*` before it is spliced into SQL.

use crate::error::TabulaError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix SQLite reserves for its own bookkeeping tables.
const RESERVED_PREFIX: &str = "sqlite_";

/// Name of the synthetic primary key every table carries.
pub const PRIMARY_KEY: &str = "id";

/// Checks `name` against the identifier grammar and returns it unchanged.
pub fn validate_identifier(name: &str) -> Result<&str, TabulaError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !head_ok || !tail_ok {
        return Err(TabulaError::InvalidIdentifier(name.to_string()));
    }
    if name
        .get(..RESERVED_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(RESERVED_PREFIX))
    {
        return Err(TabulaError::InvalidIdentifier(name.to_string()));
    }
    Ok(name)
}

/// Quotes an already validated identifier for interpolation into statement text.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

/// True when `name` would collide with the synthetic primary key (SQLite names are case-insensitive).
pub(crate) fn is_primary_key_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(PRIMARY_KEY)
}

/// Storage value kind a column is declared with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeAffinity {
    #[default]
    Text,
    Integer,
    Real,
    Blob,
    Null,
}

impl TypeAffinity {
    pub const ALL: [TypeAffinity; 5] = [
        TypeAffinity::Text,
        TypeAffinity::Integer,
        TypeAffinity::Real,
        TypeAffinity::Blob,
        TypeAffinity::Null,
    ];

    /// Maps any caller-supplied type name onto the vocabulary; unknown names become `TEXT`.
    pub fn normalize(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|affinity| affinity.as_sql().eq_ignore_ascii_case(raw))
            .unwrap_or(TypeAffinity::Text)
    }

    /// Reads a declared type back from the live schema.
    ///
    /// SQLite records a column declared `NULL` with an empty type, since `NULL`
    /// parses as a constraint there.
    pub(crate) fn from_declared(declared: &str) -> Self {
        if declared.trim().is_empty() {
            TypeAffinity::Null
        } else {
            Self::normalize(declared.trim())
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            TypeAffinity::Text => "TEXT",
            TypeAffinity::Integer => "INTEGER",
            TypeAffinity::Real => "REAL",
            TypeAffinity::Blob => "BLOB",
            TypeAffinity::Null => "NULL",
        }
    }
}

impl fmt::Display for TypeAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl<'de> Deserialize<'de> for TypeAffinity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(raw) => Ok(Self::normalize(&raw)),
            _ => Ok(Self::default()),
        }
    }
}
