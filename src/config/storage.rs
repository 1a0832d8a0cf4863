use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous};
use std::path::PathBuf;

/// Where and how tenant storage units are kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one SQLite file per tenant database.
    /// TOML: `storage.data_dir`. Default: `user_databases`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Extension appended to generated storage keys, without the dot.
    /// TOML: `storage.file_extension`. Default: `db`.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// TOML: `storage.journal_mode`. Default: `wal`.
    #[serde(default)]
    pub journal_mode: JournalMode,

    /// TOML: `storage.synchronous`. Default: `normal`.
    #[serde(default)]
    pub synchronous: Synchronous,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_extension: default_file_extension(),
            journal_mode: JournalMode::default(),
            synchronous: Synchronous::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl From<JournalMode> for SqliteJournalMode {
    fn from(mode: JournalMode) -> Self {
        match mode {
            JournalMode::Wal => SqliteJournalMode::Wal,
            JournalMode::Delete => SqliteJournalMode::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
}

impl From<Synchronous> for SqliteSynchronous {
    fn from(level: Synchronous) -> Self {
        match level {
            Synchronous::Off => SqliteSynchronous::Off,
            Synchronous::Normal => SqliteSynchronous::Normal,
            Synchronous::Full => SqliteSynchronous::Full,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("user_databases")
}

fn default_file_extension() -> String {
    "db".to_string()
}
