use crate::catalog::{CatalogCreate, CatalogHandle, DbTenantDatabase};
use crate::error::TabulaError;
use crate::tenant::TenantStore;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Storage units deleted because no record pointed at them.
    pub orphan_files: Vec<String>,
    /// Record ids removed because their storage unit was missing.
    pub orphan_records: Vec<i64>,
    /// Record ids whose storage unit was missing but which were kept because the
    /// data directory looked misconfigured.
    pub unverified_records: Vec<i64>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_files.is_empty()
            && self.orphan_records.is_empty()
            && self.unverified_records.is_empty()
    }
}

/// Ties catalog records and storage units into one lifecycle.
///
/// Both creation and deletion touch the storage unit before the record. A failure
/// between the two steps is compensated where possible and otherwise left for
/// [`DatabaseService::reconcile`].
#[derive(Clone)]
pub struct DatabaseService {
    catalog: CatalogHandle,
    store: TenantStore,
    extension: String,
}

impl DatabaseService {
    pub fn new(catalog: CatalogHandle, store: TenantStore, extension: impl Into<String>) -> Self {
        Self {
            catalog,
            store,
            extension: extension.into(),
        }
    }

    pub fn store(&self) -> &TenantStore {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub async fn list_databases(&self, owner_id: i64) -> Result<Vec<DbTenantDatabase>, TabulaError> {
        self.catalog.list_by_owner(owner_id).await
    }

    /// Record `id`, provided it belongs to `owner_id`.
    pub async fn resolve(&self, owner_id: i64, id: i64) -> Result<DbTenantDatabase, TabulaError> {
        self.catalog.get(owner_id, id).await
    }

    pub async fn create_database(
        &self,
        owner_id: i64,
        name: &str,
    ) -> Result<DbTenantDatabase, TabulaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TabulaError::InvalidRequest(
                "database name must not be empty".to_string(),
            ));
        }

        let filename = self.storage_key(owner_id);
        self.store.files().create(&filename).await?;

        let create = CatalogCreate {
            name: name.to_string(),
            filename: filename.clone(),
            owner_id,
        };
        match self.catalog.create(create).await {
            Ok(record) => {
                info!(owner_id, id = record.id, %filename, "tenant database created");
                Ok(record)
            }
            Err(e) => {
                warn!(owner_id, %filename, error = %e, "catalog insert failed, removing storage unit");
                if let Err(cleanup) = self.store.files().delete(&filename).await {
                    warn!(%filename, error = %cleanup, "compensating delete failed; left for reconcile");
                }
                Err(e)
            }
        }
    }

    pub async fn delete_database(&self, owner_id: i64, id: i64) -> Result<(), TabulaError> {
        let record = self.catalog.get(owner_id, id).await?;
        self.store.files().delete(&record.filename).await?;
        self.catalog.delete(record.id).await?;
        info!(owner_id, id, filename = %record.filename, "tenant database deleted");
        Ok(())
    }

    /// Removes storage units without a record and records without a storage unit.
    ///
    /// Records are only removed when the data directory exists and holds at least
    /// one recorded storage unit; otherwise a missing unit is reported in
    /// `unverified_records` and the record is kept. The catalog's own file is
    /// never treated as a storage unit.
    ///
    /// Must not run concurrently with `create_database`: a unit created but not
    /// yet recorded looks orphaned.
    pub async fn reconcile(&self) -> Result<ReconcileReport, TabulaError> {
        let records = self.catalog.list_all().await?;
        let files = self.store.files().list(&self.extension).await?;
        let catalog_file = resolve_path(self.catalog.path()).await;

        let known: HashSet<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        let mut report = ReconcileReport::default();
        let mut matched = 0usize;

        for filename in &files {
            let path = resolve_path(&self.store.files().path_for(filename)?).await;
            if path == catalog_file {
                continue;
            }
            if known.contains(filename.as_str()) {
                matched += 1;
                continue;
            }
            warn!(%filename, "deleting storage unit with no catalog record");
            self.store.files().delete(filename).await?;
            report.orphan_files.push(filename.clone());
        }

        let data_dir = self.store.files().data_dir();
        let trusted = matched > 0;
        for record in &records {
            if self.store.files().exists(&record.filename).await? {
                continue;
            }
            if trusted {
                warn!(id = record.id, filename = %record.filename, "removing catalog record with no storage unit");
                self.catalog.delete(record.id).await?;
                report.orphan_records.push(record.id);
            } else {
                report.unverified_records.push(record.id);
            }
        }

        if !report.unverified_records.is_empty() {
            warn!(
                data_dir = %data_dir.display(),
                records = report.unverified_records.len(),
                "data directory is missing or holds no recorded units; keeping catalog records without storage units"
            );
        }

        Ok(report)
    }

    fn storage_key(&self, owner_id: i64) -> String {
        format!(
            "{owner_id}_{}.{}",
            uuid::Uuid::new_v4().simple(),
            self.extension
        )
    }
}

async fn resolve_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}
