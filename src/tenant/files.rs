//! Storage unit lifecycle: one SQLite file per tenant database under a shared
//! data directory.

use crate::config::{JournalMode, StorageConfig, Synchronous};
use crate::error::TabulaError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Files SQLite may leave next to a storage unit.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Creates, deletes and opens the per-tenant SQLite files under one data directory.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    data_dir: PathBuf,
    journal_mode: JournalMode,
    synchronous: Synchronous,
}

impl StorageRoot {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            journal_mode: JournalMode::default(),
            synchronous: Synchronous::default(),
        }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self {
            data_dir: cfg.data_dir.clone(),
            journal_mode: cfg.journal_mode,
            synchronous: cfg.synchronous,
        }
    }

    #[must_use]
    pub fn with_journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.journal_mode = journal_mode;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Deterministic location of the storage unit keyed by `filename`.
    ///
    /// The key is opaque, but it must name a single file inside the data directory.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, TabulaError> {
        let escapes = filename.is_empty()
            || filename == "."
            || filename.contains("..")
            || filename.contains(['/', '\\', '\0']);
        if escapes {
            return Err(TabulaError::InvalidStorageKey(filename.to_string()));
        }
        Ok(self.data_dir.join(filename))
    }

    /// Creates an empty storage unit. Succeeds when the file already exists.
    pub async fn create(&self, filename: &str) -> Result<(), TabulaError> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.data_dir).await?;

        let conn = SqliteConnection::connect_with(&self.connect_options(path).create_if_missing(true))
            .await?;
        conn.close().await?;

        info!(filename, "storage unit created");
        Ok(())
    }

    /// Removes the storage unit and its sidecar files. A missing file is not an error.
    pub async fn delete(&self, filename: &str) -> Result<(), TabulaError> {
        let path = self.path_for(filename)?;

        let removed = remove_if_present(&path).await?;
        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = path.clone().into_os_string();
            sidecar.push(suffix);
            remove_if_present(Path::new(&sidecar)).await?;
        }

        if removed {
            info!(filename, "storage unit deleted");
        } else {
            debug!(filename, "storage unit already absent");
        }
        Ok(())
    }

    pub async fn exists(&self, filename: &str) -> Result<bool, TabulaError> {
        let path = self.path_for(filename)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Storage keys present in the data directory that end in `.{extension}`.
    pub async fn list(&self, extension: &str) -> Result<Vec<String>, TabulaError> {
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{extension}");
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if name.ends_with(&suffix) => keys.push(name),
                Ok(_) => {}
                Err(name) => warn!(?name, "skipping non UTF-8 file in data directory"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Opens one connection to an existing storage unit.
    pub(crate) async fn connect(&self, filename: &str) -> Result<SqliteConnection, TabulaError> {
        let path = self.path_for(filename)?;
        let conn = SqliteConnection::connect_with(&self.connect_options(path)).await?;
        Ok(conn)
    }

    fn connect_options(&self, path: PathBuf) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .journal_mode(self.journal_mode.into())
            .synchronous(self.synchronous.into())
    }
}

/// Closes a per-operation connection and hands back the operation's result.
pub(crate) async fn finish<T>(
    conn: SqliteConnection,
    result: Result<T, TabulaError>,
) -> Result<T, TabulaError> {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close storage unit connection");
    }
    result
}

async fn remove_if_present(path: &Path) -> Result<bool, TabulaError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_for_joins_plain_keys() {
        let root = StorageRoot::new("/data");
        assert_eq!(
            root.path_for("7_0af3c2.db").unwrap(),
            PathBuf::from("/data/7_0af3c2.db")
        );
    }

    #[test]
    fn path_for_refuses_keys_that_leave_the_data_dir() {
        let root = StorageRoot::new("/data");
        for key in ["", ".", "..", "../etc/passwd", "a/b.db", "a\\b.db", "nul\0.db"] {
            assert!(
                matches!(root.path_for(key), Err(TabulaError::InvalidStorageKey(_))),
                "{key:?} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn create_then_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path().join("units"));

        root.create("1_abc.db").await.unwrap();
        assert!(root.exists("1_abc.db").await.unwrap());
        root.create("1_abc.db").await.unwrap();

        root.delete("1_abc.db").await.unwrap();
        assert!(!root.exists("1_abc.db").await.unwrap());
        root.delete("1_abc.db").await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path());
        root.create("1_a.db").await.unwrap();
        root.create("2_b.db").await.unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();

        let keys = root.list("db").await.unwrap();
        assert_eq!(keys, vec!["1_a.db".to_string(), "2_b.db".to_string()]);
    }

    #[tokio::test]
    async fn list_on_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path().join("nope"));
        assert!(root.list("db").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn connect_does_not_create_missing_units() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path());
        assert!(root.connect("9_missing.db").await.is_err());
        assert!(!root.exists("9_missing.db").await.unwrap());
    }
}
