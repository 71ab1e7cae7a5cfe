//! scms-api - site content management service
//!
//! Serves the nonprofit site's content over REST: singleton sections with
//! partial-merge writes, collections, dynamic pages and uploaded files.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scms_common::config::{load_toml_config, resolve_root_folder, RootFolder};
use scms_common::db::init_database;
use scms_api::uploads::UploadStore;
use scms_api::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for scms-api
#[derive(Parser, Debug)]
#[command(name = "scms-api")]
#[command(about = "Content management service for the nonprofit website")]
#[command(version)]
struct Args {
    /// Root folder holding scms.db and uploads/ (overrides SCMS_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file (default: ~/.config/scms/config.toml or /etc/scms/config.toml)
    #[arg(short, long, env = "SCMS_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SCMS_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides the config file)
    #[arg(long, env = "SCMS_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Needed before tracing starts: it carries the log level
    let config = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "scms_api={level},scms_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .init();

    info!(
        "Starting scms-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolder::new(resolve_root_folder(args.root_folder.as_deref(), &config));
    root_folder
        .ensure_directories()
        .with_context(|| format!("Failed to create root folder {}", root_folder.path().display()))?;
    info!("Root folder: {}", root_folder.path().display());

    let db_path = root_folder.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("✓ Database ready: {}", db_path.display());

    let state = AppState::new(
        pool,
        UploadStore::new(root_folder.uploads_path()),
        config.max_upload_bytes,
    );
    let app = build_router(state);

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("scms-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
