use mimalloc::MiMalloc;
use std::{net::SocketAddr, sync::Arc};
use tabula::config::Config;
use tabula::server::router::{TabulaState, tabula_router};
use tabula::service::DatabaseService;
use tabula::tenant::{StorageRoot, TenantStore};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_toml();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        data_dir = %cfg.storage.data_dir.display(),
        journal_mode = ?cfg.storage.journal_mode,
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port
    );

    let catalog = tabula::catalog::spawn(&cfg.basic.database_url).await?;
    let store = TenantStore::new(StorageRoot::from_config(&cfg.storage));
    let databases = DatabaseService::new(catalog, store, cfg.storage.file_extension.clone());

    match databases.reconcile().await {
        Ok(report) if report.is_clean() => info!("Storage units and catalog agree."),
        Ok(report) => warn!(
            orphan_files = report.orphan_files.len(),
            orphan_records = report.orphan_records.len(),
            unverified_records = report.unverified_records.len(),
            "Reconciliation found orphaned tenant databases."
        ),
        Err(e) => warn!(error = %e, "Reconciliation failed; continuing startup."),
    }

    let tabula_key: Arc<str> = Arc::from(cfg.basic.tabula_key.clone());
    let state = TabulaState::new(databases, tabula_key);
    let app = tabula_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
