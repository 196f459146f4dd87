//! Shared fixtures for vitrine-cr integration tests

#![allow(dead_code)]

use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use vitrine_common::db::init_memory_pool;
use vitrine_cr::favorites::DocumentFavorites;
use vitrine_cr::registry::SqliteRegistryIndex;
use vitrine_cr::resolver::{CompositionResolver, ResolverSettings};
use vitrine_cr::store::{
    DocumentStore, Scope, SqliteDocumentStore, COMPOSITIONS, FAVORITES, GENERATION_JOBS, PRODUCTS,
};

pub const STORE: &str = "loja-1";

/// In-memory database with a resolver wired to it
pub struct TestEnv {
    pub pool: SqlitePool,
    pub store: SqliteDocumentStore,
    pub registry: SqliteRegistryIndex,
    pub resolver: Arc<CompositionResolver>,
}

pub async fn setup() -> TestEnv {
    setup_with(ResolverSettings::default()).await
}

pub async fn setup_with(settings: ResolverSettings) -> TestEnv {
    let pool = init_memory_pool().await.expect("Should create in-memory database");
    let store = SqliteDocumentStore::new(pool.clone());
    let registry = SqliteRegistryIndex::new(pool.clone());

    let store_arc: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let resolver = CompositionResolver::new(
        store_arc.clone(),
        Arc::new(registry.clone()),
        Arc::new(DocumentFavorites::new(store_arc)),
        settings,
    );

    TestEnv {
        pool,
        store,
        registry,
        resolver: Arc::new(resolver),
    }
}

impl TestEnv {
    /// Composition in the per-store collection
    pub async fn composition(&self, id: &str, body: Value) {
        self.insert(COMPOSITIONS, Scope::Store(STORE), id, body).await;
    }

    /// Composition in the flat legacy collection
    pub async fn legacy_composition(&self, id: &str, body: Value) {
        self.insert(COMPOSITIONS, Scope::Global, id, body).await;
    }

    pub async fn job(&self, id: &str, body: Value) {
        self.insert(GENERATION_JOBS, Scope::Global, id, body).await;
    }

    pub async fn catalog_product(&self, id: &str, body: Value) {
        self.insert(PRODUCTS, Scope::Store(STORE), id, body).await;
    }

    pub async fn favorite(&self, id: &str, body: Value) {
        self.insert(FAVORITES, Scope::Global, id, body).await;
    }

    async fn insert(&self, collection: &str, scope: Scope<'_>, id: &str, body: Value) {
        self.store
            .insert(collection, scope, id, &body)
            .await
            .expect("Should seed document");
    }
}
