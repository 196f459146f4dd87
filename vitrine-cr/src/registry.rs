//! Composition registry index
//!
//! Derived mapping of `(store, composition)` to resolved product snapshots.
//! Rows are written only by the resolver, after a successful (or fallback)
//! resolution, and are whole-row overwrites: last writer wins. There is no
//! expiry; a wrong row is corrected by removing it so the next call
//! re-resolves.
//!
//! Alongside each row, every snapshot is indexed by `(store, product id)` so
//! that later compositions of the same store that only carry bare product
//! ids can be served without a catalog round-trip. Ids are only unique
//! within a store, so nothing here is ever shared across stores.

use crate::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use vitrine_common::Product;

/// Source tag recorded for placeholder results; these are never indexed by product id
pub const FALLBACK_SOURCE: &str = "fallback";

/// One registry row
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub store_id: String,
    pub composition_id: String,
    pub products: Vec<Product>,
    pub source_strategy: String,
    pub resolved_at: DateTime<Utc>,
}

/// Registry index collaborator
#[async_trait]
pub trait RegistryIndex: Send + Sync {
    /// Row for a composition of a store, if one was ever written
    async fn get_by_composition_id(
        &self,
        store_id: &str,
        composition_id: &str,
    ) -> Result<Option<RegistryEntry>, StoreError>;

    /// Snapshots for the given product ids of a store; missing ids are
    /// omitted, order follows `ids`
    async fn get_by_ids(&self, store_id: &str, ids: &[String]) -> Result<Vec<Product>, StoreError>;

    /// Overwrite the row for a composition
    async fn put_by_composition_id(
        &self,
        store_id: &str,
        composition_id: &str,
        products: &[Product],
        source_strategy: &str,
    ) -> Result<(), StoreError>;

    /// Drop the row for a composition together with the product snapshots it
    /// wrote; returns whether a row existed
    async fn remove(&self, store_id: &str, composition_id: &str) -> Result<bool, StoreError>;
}

/// Registry index stored in the shared SQLite database
#[derive(Clone)]
pub struct SqliteRegistryIndex {
    db: SqlitePool,
}

impl SqliteRegistryIndex {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[async_trait]
impl RegistryIndex for SqliteRegistryIndex {
    async fn get_by_composition_id(
        &self,
        store_id: &str,
        composition_id: &str,
    ) -> Result<Option<RegistryEntry>, StoreError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT products, source_strategy, resolved_at
            FROM composition_registry
            WHERE store_id = ? AND composition_id = ?
            "#,
        )
        .bind(store_id)
        .bind(composition_id)
        .fetch_optional(&self.db)
        .await?;

        let Some((products, source_strategy, resolved_at)) = row else {
            return Ok(None);
        };

        let products: Vec<Product> = serde_json::from_str(&products)
            .map_err(|e| StoreError::Malformed(format!("registry {}/{}: {}", store_id, composition_id, e)))?;
        let resolved_at = DateTime::parse_from_rfc3339(&resolved_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::Malformed(format!("registry {}/{}: {}", store_id, composition_id, e)))?;

        Ok(Some(RegistryEntry {
            store_id: store_id.to_string(),
            composition_id: composition_id.to_string(),
            products,
            source_strategy,
            resolved_at,
        }))
    }

    async fn get_by_ids(&self, store_id: &str, ids: &[String]) -> Result<Vec<Product>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT product_id, snapshot FROM registry_products WHERE store_id = ? AND product_id IN ({})",
            placeholders
        );
        let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(store_id);
        for id in ids {
            query = query.bind(id.as_str());
        }
        let rows = query.fetch_all(&self.db).await?;

        let mut by_id: HashMap<String, Product> = HashMap::with_capacity(rows.len());
        for (product_id, snapshot) in rows {
            match serde_json::from_str::<Product>(&snapshot) {
                Ok(product) => {
                    by_id.insert(product_id, product);
                }
                Err(e) => {
                    tracing::warn!(product_id = %product_id, error = %e, "Skipping malformed registry snapshot");
                }
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn put_by_composition_id(
        &self,
        store_id: &str,
        composition_id: &str,
        products: &[Product],
        source_strategy: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO composition_registry (store_id, composition_id, products, source_strategy, resolved_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (store_id, composition_id) DO UPDATE SET
                products = excluded.products,
                source_strategy = excluded.source_strategy,
                resolved_at = excluded.resolved_at
            "#,
        )
        .bind(store_id)
        .bind(composition_id)
        .bind(encode(&products)?)
        .bind(source_strategy)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if source_strategy != FALLBACK_SOURCE {
            for product in products {
                sqlx::query(
                    r#"
                    INSERT INTO registry_products (store_id, product_id, snapshot, composition_id, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT (store_id, product_id) DO UPDATE SET
                        snapshot = excluded.snapshot,
                        composition_id = excluded.composition_id,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(store_id)
                .bind(&product.id)
                .bind(encode(product)?)
                .bind(composition_id)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, store_id: &str, composition_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query("DELETE FROM composition_registry WHERE store_id = ? AND composition_id = ?")
            .bind(store_id)
            .bind(composition_id)
            .execute(&mut *tx)
            .await?;

        let snapshots = sqlx::query("DELETE FROM registry_products WHERE store_id = ? AND composition_id = ?")
            .bind(store_id)
            .bind(composition_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            store_id,
            composition_id,
            snapshots = snapshots.rows_affected(),
            "Removed registry entry"
        );
        Ok(result.rows_affected() > 0)
    }
}
