//! catalog-rs (Regional Sync) - keeps local regionals in step with the
//! external system of record
//!
//! Startup: tracing → TOML config → root folder → database → sync engine →
//! optional startup sync → HTTP server.

use anyhow::{Context, Result};
use catalog_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use catalog_rs::config::{resolve_port, SyncSettings, MODULE_NAME};
use catalog_rs::db::{RegionalStore, SqliteRegionalStore};
use catalog_rs::logging::{init_tracing, resolve_log_level};
use catalog_rs::services::{HttpRegionalClient, RegionalSource, RegionalSyncService};
use catalog_rs::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "catalog-rs", version, about = "Regional sync service")]
struct Args {
    /// Root folder holding catalog.db
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// URL of the external regional list
    #[arg(long)]
    regionais_url: Option<String>,

    /// Run one sync before serving requests
    #[arg(long)]
    sync_on_startup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // TOML is read before tracing so its logging section can seed the subscriber
    let toml_config = TomlConfig::load(MODULE_NAME);
    let log_level = resolve_log_level(toml_config.as_ref().ok());
    let log_file = toml_config
        .as_ref()
        .ok()
        .and_then(|c| c.logging.file.clone());
    let log_file_result = init_tracing(&log_level, log_file.as_deref());

    // Log build identification immediately after tracing init
    info!(
        "Starting Catalog Regional Sync ({}) v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let (Err(e), Some(path)) = (&log_file_result, &log_file) {
        warn!("Cannot open log file {}: {}; logging to stderr", path.display(), e);
    }

    let toml_config = toml_config.context("Failed to load configuration")?;

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .with_toml(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = match catalog_common::db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let settings = SyncSettings::resolve(args.regionais_url.as_deref(), &toml_config.regionais);
    info!(
        url = %settings.url,
        timeout_secs = settings.timeout.as_secs(),
        serialize_runs = settings.serialize_runs,
        enforce_single_active = settings.enforce_single_active,
        "Regional sync configured"
    );

    if settings.enforce_single_active {
        catalog_common::db::ensure_single_active_index(&pool)
            .await
            .context("Failed to enable single-active constraint (run a sync to repair duplicates first)")?;
    }

    let store: Arc<dyn RegionalStore> = Arc::new(SqliteRegionalStore::new(pool));
    let source: Arc<dyn RegionalSource> =
        Arc::new(HttpRegionalClient::new(settings.url.clone(), settings.timeout)?);
    let sync = Arc::new(
        RegionalSyncService::new(Arc::clone(&store), source)
            .with_serialized_runs(settings.serialize_runs),
    );

    if args.sync_on_startup {
        match sync.sync().await {
            Ok(report) => info!("Startup sync: {}", report),
            Err(e) => warn!("Startup sync failed: {}", e),
        }
    }

    let state = AppState::new(store, sync);
    let app = build_router(state);

    let port = resolve_port(args.port, &toml_config);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("{} listening on http://{}", MODULE_NAME, addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
