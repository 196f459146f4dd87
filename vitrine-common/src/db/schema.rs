//! Table definitions
//!
//! `documents` is a generic collection store: `scope` holds the owning store
//! id for per-store collections and the empty string for flat collections.
//! `composition_registry` and `registry_products` are derived data written
//! only by the composition resolver. Both are keyed by store, since
//! composition and product ids are only unique within one store.

use crate::Result;
use sqlx::SqlitePool;

/// Scope value used for flat (global) collections
pub const GLOBAL_SCOPE: &str = "";

/// Create all tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            scope TEXT NOT NULL DEFAULT '',
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (collection, scope, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS composition_registry (
            store_id TEXT NOT NULL,
            composition_id TEXT NOT NULL,
            products TEXT NOT NULL,
            source_strategy TEXT NOT NULL,
            resolved_at TEXT NOT NULL,
            PRIMARY KEY (store_id, composition_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registry_products (
            store_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            snapshot TEXT NOT NULL,
            composition_id TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (store_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (documents, composition_registry, registry_products)");

    Ok(())
}
