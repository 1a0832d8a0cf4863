use crate::catalog::models::{CatalogCreate, DbTenantDatabase};
use crate::catalog::schema::CATALOG_INIT;
use crate::error::TabulaError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::{str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug)]
pub enum CatalogMessage {
    /// Insert a database record and return it.
    Create(
        CatalogCreate,
        RpcReplyPort<Result<DbTenantDatabase, TabulaError>>,
    ),

    /// Get a record by id, scoped to its owner.
    Get(i64, i64, RpcReplyPort<Result<DbTenantDatabase, TabulaError>>),

    /// List the records of one owner.
    ListByOwner(i64, RpcReplyPort<Result<Vec<DbTenantDatabase>, TabulaError>>),

    /// List every record (reconciliation).
    ListAll(RpcReplyPort<Result<Vec<DbTenantDatabase>, TabulaError>>),

    /// Delete a record by id.
    Delete(i64, RpcReplyPort<Result<(), TabulaError>>),
}

#[derive(Clone)]
pub struct CatalogHandle {
    actor: ActorRef<CatalogMessage>,
    path: PathBuf,
}

impl CatalogHandle {
    /// File backing the catalog itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn create(&self, create: CatalogCreate) -> Result<DbTenantDatabase, TabulaError> {
        ractor::call!(self.actor, CatalogMessage::Create, create)
            .map_err(|e| TabulaError::RactorError(format!("Catalog Create RPC failed: {e}")))?
    }

    pub async fn get(&self, owner_id: i64, id: i64) -> Result<DbTenantDatabase, TabulaError> {
        ractor::call!(self.actor, CatalogMessage::Get, owner_id, id)
            .map_err(|e| TabulaError::RactorError(format!("Catalog Get RPC failed: {e}")))?
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<DbTenantDatabase>, TabulaError> {
        ractor::call!(self.actor, CatalogMessage::ListByOwner, owner_id).map_err(|e| {
            TabulaError::RactorError(format!("Catalog ListByOwner RPC failed: {e}"))
        })?
    }

    pub async fn list_all(&self) -> Result<Vec<DbTenantDatabase>, TabulaError> {
        ractor::call!(self.actor, CatalogMessage::ListAll)
            .map_err(|e| TabulaError::RactorError(format!("Catalog ListAll RPC failed: {e}")))?
    }

    pub async fn delete(&self, id: i64) -> Result<(), TabulaError> {
        ractor::call!(self.actor, CatalogMessage::Delete, id)
            .map_err(|e| TabulaError::RactorError(format!("Catalog Delete RPC failed: {e}")))?
    }
}

struct CatalogState {
    pool: SqlitePool,
}

struct CatalogActor;

#[ractor::async_trait]
impl Actor for CatalogActor {
    type Msg = CatalogMessage;
    type State = CatalogState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("catalog connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("catalog schema init failed: {e}")))?;

        info!("CatalogActor initialized");
        Ok(CatalogState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CatalogMessage::Create(create, reply) => {
                let res = self.create(&state.pool, create).await;
                let _ = reply.send(res);
            }
            CatalogMessage::Get(owner_id, id, reply) => {
                let res = self.get(&state.pool, owner_id, id).await;
                let _ = reply.send(res);
            }
            CatalogMessage::ListByOwner(owner_id, reply) => {
                let res = self.list_by_owner(&state.pool, owner_id).await;
                let _ = reply.send(res);
            }
            CatalogMessage::ListAll(reply) => {
                let res = self.list_all(&state.pool).await;
                let _ = reply.send(res);
            }
            CatalogMessage::Delete(id, reply) => {
                let res = self.delete(&state.pool, id).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl CatalogActor {
    async fn create(
        &self,
        pool: &SqlitePool,
        create: CatalogCreate,
    ) -> Result<DbTenantDatabase, TabulaError> {
        let now = Utc::now();
        let res = sqlx::query_as::<_, DbTenantDatabase>(
            r#"
        INSERT INTO tenant_databases (name, filename, owner_id, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, filename, owner_id, created_at
        "#,
        )
        .bind(&create.name)
        .bind(&create.filename)
        .bind(create.owner_id)
        .bind(now)
        .fetch_one(pool)
        .await;

        match res {
            Ok(record) => Ok(record),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(TabulaError::Conflict(format!(
                    "database '{}' already exists",
                    create.name
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(
        &self,
        pool: &SqlitePool,
        owner_id: i64,
        id: i64,
    ) -> Result<DbTenantDatabase, TabulaError> {
        sqlx::query_as::<_, DbTenantDatabase>(
            r#"
        SELECT id, name, filename, owner_id, created_at
        FROM tenant_databases
        WHERE id = ? AND owner_id = ?
        "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(TabulaError::DatabaseNotFound(id))
    }

    async fn list_by_owner(
        &self,
        pool: &SqlitePool,
        owner_id: i64,
    ) -> Result<Vec<DbTenantDatabase>, TabulaError> {
        let rows = sqlx::query_as::<_, DbTenantDatabase>(
            r#"
        SELECT id, name, filename, owner_id, created_at
        FROM tenant_databases
        WHERE owner_id = ?
        ORDER BY id
        "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn list_all(&self, pool: &SqlitePool) -> Result<Vec<DbTenantDatabase>, TabulaError> {
        let rows = sqlx::query_as::<_, DbTenantDatabase>(
            r#"
        SELECT id, name, filename, owner_id, created_at
        FROM tenant_databases
        ORDER BY id
        "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<(), TabulaError> {
        let done = sqlx::query("DELETE FROM tenant_databases WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(TabulaError::DatabaseNotFound(id));
        }
        Ok(())
    }
}

/// Spawn the catalog actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<CatalogHandle, TabulaError> {
    let path = SqliteConnectOptions::from_str(database_url)?
        .get_filename()
        .to_path_buf();
    let (actor, _jh) = ractor::Actor::spawn(None, CatalogActor, database_url.to_string())
        .await
        .map_err(|e| TabulaError::RactorError(format!("failed to spawn CatalogActor: {e}")))?;

    Ok(CatalogHandle { actor, path })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), TabulaError> {
    for stmt in CATALOG_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
