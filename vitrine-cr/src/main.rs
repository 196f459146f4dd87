//! vitrine-cr - Composition Resolver service
//!
//! Answers "which catalog products appear in this look composition?" over
//! HTTP, backed by the store's document collections and a self-healing
//! registry of past answers.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vitrine_common::config::{resolve_config_path, ConfigOverrides, LoggingConfig, TomlConfig};
use vitrine_cr::favorites::DocumentFavorites;
use vitrine_cr::registry::{RegistryIndex, SqliteRegistryIndex};
use vitrine_cr::resolver::{CompositionResolver, ResolverSettings};
use vitrine_cr::store::{DocumentStore, SqliteDocumentStore};
use vitrine_cr::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "vitrine-cr")]
#[command(about = "Composition product resolver for Vitrine")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "VITRINE_CR_PORT")]
    port: Option<u16>,

    /// Path to SQLite database (overrides config file)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_path: args.config,
        database_path: args.database,
        port: args.port,
    };
    let config = TomlConfig::load(&overrides)?;

    init_tracing(&config.logging)?;

    info!(
        "Starting Vitrine Composition Resolver (vitrine-cr) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolve_config_path(overrides.config_path.as_deref()) {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("Config file: none, using compiled defaults"),
    }
    info!(
        scan_limit = config.resolver.scan_limit,
        strategy_timeout_ms = config.resolver.strategy_timeout_ms,
        fetch_concurrency = config.resolver.fetch_concurrency,
        "Resolver settings"
    );

    info!("Database: {}", config.database_path.display());
    let pool = vitrine_common::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool.clone()));
    let registry: Arc<dyn RegistryIndex> = Arc::new(SqliteRegistryIndex::new(pool));
    let favorites = Arc::new(DocumentFavorites::new(store.clone()));

    let resolver = CompositionResolver::new(
        store,
        registry.clone(),
        favorites,
        ResolverSettings::from(&config.resolver),
    );
    let app = build_router(AppState::new(Arc::new(resolver), registry));

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
