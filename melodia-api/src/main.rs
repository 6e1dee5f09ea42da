//! melodia-api - HTTP backend for the Melodia music library
//!
//! Serves the album and song catalog and each user's playlists, liked songs
//! and favorite albums. `melodia-api issue-token --user <id>` prints a
//! session token for a user and exits.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use melodia_api::{build_router, AppState};
use melodia_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use melodia_common::db::init_database;
use melodia_common::session::{issue_token, load_session_secret};
use melodia_common::DocumentStore;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for melodia-api
#[derive(Parser, Debug)]
#[command(name = "melodia-api")]
#[command(about = "HTTP backend for the Melodia music library")]
#[command(version)]
struct Args {
    /// Root folder holding melodia.db
    #[arg(short, long, env = "MELODIA_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to listen on (overrides melodia.toml)
    #[arg(short, long, env = "MELODIA_BIND")]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Print a session token for a user
    IssueToken {
        /// User id the token is issued to
        #[arg(short, long)]
        user: String,

        /// Token lifetime in hours (overrides melodia.toml)
        #[arg(long)]
        ttl_hours: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_source) = TomlConfig::load_standard();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting Melodia API (melodia-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let root_folder = RootFolderResolver::new("melodia-api")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(config.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    let session_secret = load_session_secret(&pool)
        .await
        .context("Failed to load session secret")?;

    if let Some(Command::IssueToken { user, ttl_hours }) = args.command {
        let hours = ttl_hours.unwrap_or_else(|| config.session_ttl_hours());
        let ttl = Duration::from_secs(hours.saturating_mul(3600));
        let token = issue_token(&user, ttl, &session_secret, Utc::now().timestamp_millis())?;

        info!("Issued session token for {} valid {}h", user, hours);
        println!("{}", token);
        return Ok(());
    }

    let state = AppState::new(DocumentStore::new(pool), &session_secret);
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.bind_address());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("melodia-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
