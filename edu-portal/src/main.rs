//! edu-portal - student information backend
//!
//! Startup: load bootstrap config, initialize tracing, open (or create) the
//! database in the root folder, load the shared secret and serve.

use anyhow::{Context, Result};
use clap::Parser;
use edu_common::api::{load_shared_secret, load_token_key};
use edu_common::config::{prepare_database_path, resolve_port, resolve_root_folder, LoggingConfig, TomlConfig};
use edu_common::db::init_database;
use edu_portal::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edu-portal")]
#[command(about = "Student information portal")]
#[command(version)]
struct Args {
    /// Folder holding the database file
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file (defaults to ~/.config/edu/config.toml, then /etc/edu/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TomlConfig::load(path)?,
        None => TomlConfig::load_or_default()?,
    };

    init_tracing(&config.logging)?;

    // Build identification right after tracing init, before any database work
    info!(
        "Starting edu-portal v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let port = resolve_port(args.port, &config)?;
    let db_path = prepare_database_path(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let shared_secret = load_shared_secret(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot load shared secret: {}", e))?;
    if shared_secret == 0 {
        warn!("Admin API authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for admin API authentication");
    }
    let token_key = load_token_key(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot load student token key: {}", e))?;
    info!(policy = ?config.enrollment, "Enrollment policy");

    let state = AppState::new(
        pool,
        shared_secret,
        token_key,
        config.token_ttl_secs,
        config.enrollment,
    );
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;
    info!("edu-portal listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
