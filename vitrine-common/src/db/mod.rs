//! Database access shared by Vitrine services
//!
//! A single SQLite file holds the document collections and the derived
//! composition registry.

pub mod schema;

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Initialize database connection pool
///
/// Creates the database file (and its parent directory) if missing, then
/// ensures every table exists.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect(&db_url)
        .await?;

    schema::init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Pinned to one long-lived connection, since every SQLite in-memory
/// connection is a separate database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    schema::init_tables(&pool).await?;

    Ok(pool)
}
