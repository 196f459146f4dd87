//! Catalog fetch for collected product ids

use super::ResolutionStrategy;
use crate::resolver::context::ResolutionContext;
use crate::store::{Document, DocumentStore, Scope, StoreError, PRODUCTS};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Strategy: read collected ids straight from the store's catalog
///
/// Ids already served by registry snapshots are not fetched again. The
/// remaining ids are read in one batch; if the batch call fails, each id is
/// fetched on its own with bounded parallelism and failed fetches are
/// dropped. Results keep the order in which ids were collected.
pub struct CatalogIds {
    store: Arc<dyn DocumentStore>,
    concurrency: usize,
}

impl CatalogIds {
    pub fn new(store: Arc<dyn DocumentStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    async fn fetch_each(&self, store_id: &str, ids: &[String]) -> Vec<Document> {
        let results: Vec<Option<Document>> = stream::iter(ids.to_vec())
            .map(|id| {
                let store = Arc::clone(&self.store);
                let store_id = store_id.to_string();
                async move {
                    match store.get(PRODUCTS, Scope::Store(&store_id), &id).await {
                        Ok(doc) => doc,
                        Err(e) => {
                            tracing::warn!(product_id = %id, error = %e, "Catalog fetch failed, dropping product");
                            None
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    async fn fetch(&self, store_id: &str, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        match self.store.get_many(PRODUCTS, Scope::Store(store_id), ids).await {
            Ok(docs) => Ok(docs),
            Err(e) if e.is_unavailable() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Catalog batch fetch failed, fetching products individually");
                Ok(self.fetch_each(store_id, ids).await)
            }
        }
    }
}

/// Catalog body with the document id filled in when the record omits it
fn with_id(doc: Document) -> Value {
    let Document { id, mut body } = doc;
    if let Value::Object(map) = &mut body {
        map.entry("id").or_insert_with(|| Value::String(id));
    }
    body
}

#[async_trait]
impl ResolutionStrategy for CatalogIds {
    fn name(&self) -> &'static str {
        "catalog_ids"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        let (ids, prefetched) = ctx.take_pending();
        if ids.is_empty() {
            return Ok(None);
        }

        let mut known: HashMap<String, Value> = HashMap::with_capacity(ids.len());
        for product in prefetched {
            let value = serde_json::to_value(&product).map_err(|e| StoreError::Malformed(e.to_string()))?;
            known.insert(product.id, value);
        }

        let missing: Vec<String> = ids.iter().filter(|id| !known.contains_key(*id)).cloned().collect();
        if !missing.is_empty() {
            for doc in self.fetch(&ctx.store_id, &missing).await? {
                known.insert(doc.id.clone(), with_id(doc));
            }
        }

        let found: Vec<Value> = ids.iter().filter_map(|id| known.remove(id)).collect();
        if found.is_empty() {
            return Ok(None);
        }
        if found.len() < ids.len() {
            tracing::debug!(found = found.len(), wanted = ids.len(), "Some collected ids are not in the catalog");
        }
        Ok(Some(found))
    }
}
