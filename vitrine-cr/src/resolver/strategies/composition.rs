//! Direct composition lookup (per-store location, then legacy flat collection)

use super::ResolutionStrategy;
use crate::resolver::context::ResolutionContext;
use crate::resolver::fields::{first_string, Composition, RECORD_OWNER};
use crate::store::{DocumentStore, FieldFilter, Scope, StoreError, COMPOSITIONS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Whether a legacy flat record may be read by `store_id`
///
/// The first owner field present decides; records with no owner are shared.
pub(crate) fn legacy_visible_to(body: &Value, store_id: &str) -> bool {
    match first_string(body, RECORD_OWNER) {
        Some(owner) => owner == store_id,
        None => true,
    }
}

/// Query filter sets covering every legacy record visible to `store_id`
///
/// The sets are disjoint: owned by `storeId`, owned by `lojaId` alone, and
/// unowned.
pub(crate) fn legacy_owner_filters(store_id: &str) -> Vec<Vec<FieldFilter>> {
    let (primary, secondary) = (RECORD_OWNER[0], RECORD_OWNER[1]);
    vec![
        vec![FieldFilter::eq(primary, store_id)],
        vec![FieldFilter::missing(primary), FieldFilter::eq(secondary, store_id)],
        vec![FieldFilter::missing(primary), FieldFilter::missing(secondary)],
    ]
}

/// Fetch a composition from the per-store collection, falling back to the
/// legacy flat collection
///
/// Legacy records that name a different store are ignored.
pub(crate) async fn find_composition(
    store: &dyn DocumentStore,
    store_id: &str,
    composition_id: &str,
) -> Result<Option<Composition>, StoreError> {
    if let Some(doc) = store.get(COMPOSITIONS, Scope::Store(store_id), composition_id).await? {
        return Ok(Some(Composition::from(&doc)));
    }

    let Some(doc) = store.get(COMPOSITIONS, Scope::Global, composition_id).await? else {
        return Ok(None);
    };

    if !legacy_visible_to(&doc.body, store_id) {
        tracing::debug!(composition_id, "Legacy composition belongs to another store");
        return Ok(None);
    }
    Ok(Some(Composition::from(&doc)))
}

/// Resolve a composition reference: embedded products win, bare ids are queued
///
/// Ids are queued even when products are embedded, so they are still there
/// if every embedded record fails validation. Compositions already looked up
/// during this call are skipped.
pub(crate) async fn follow_composition(
    store: &dyn DocumentStore,
    ctx: &mut ResolutionContext,
    composition_id: &str,
) -> Result<Option<Vec<Value>>, StoreError> {
    if !ctx.visit_composition(composition_id) {
        return Ok(None);
    }

    let Some(composition) = find_composition(store, &ctx.store_id, composition_id).await? else {
        return Ok(None);
    };

    ctx.collect_ids(composition.refs.ids);
    if composition.refs.embedded.is_empty() {
        return Ok(None);
    }
    Ok(Some(composition.refs.embedded))
}

/// Strategy: the composition record itself
pub struct CompositionLookup {
    store: Arc<dyn DocumentStore>,
}

impl CompositionLookup {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolutionStrategy for CompositionLookup {
    fn name(&self) -> &'static str {
        "composition_embedded"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        let composition_id = ctx.composition_id.clone();
        follow_composition(self.store.as_ref(), ctx, &composition_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use serde_json::json;
    use vitrine_common::db::init_memory_pool;

    async fn setup() -> (SqliteDocumentStore, CompositionLookup) {
        let store = SqliteDocumentStore::new(init_memory_pool().await.unwrap());
        let strategy = CompositionLookup::new(Arc::new(store.clone()));
        (store, strategy)
    }

    #[tokio::test]
    async fn test_embedded_products_returned() {
        let (store, strategy) = setup().await;
        store
            .insert(
                COMPOSITIONS,
                Scope::Store("s1"),
                "c1",
                &json!({"products": [{"id": "p1", "nome": "Vestido"}], "productIds": ["p9"]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c1", None);
        let found = strategy.attempt(&mut ctx).await.unwrap().unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], "p1");
        assert_eq!(ctx.pending_ids(), ["p9"]);
    }

    #[tokio::test]
    async fn test_legacy_location_ids_collected() {
        let (store, strategy) = setup().await;
        store
            .insert(
                COMPOSITIONS,
                Scope::Global,
                "c2",
                &json!({"storeId": "s1", "productIds": ["p7"], "registeredProductIds": ["p8"]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c2", None);
        assert!(strategy.attempt(&mut ctx).await.unwrap().is_none());
        assert_eq!(ctx.pending_ids(), ["p7", "p8"]);
    }

    #[tokio::test]
    async fn test_legacy_record_of_other_store_ignored() {
        let (store, strategy) = setup().await;
        store
            .insert(
                COMPOSITIONS,
                Scope::Global,
                "c3",
                &json!({"storeId": "s2", "products": [{"id": "p1", "nome": "Vestido"}]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c3", None);
        assert!(strategy.attempt(&mut ctx).await.unwrap().is_none());
    }

    #[test]
    fn test_legacy_visibility() {
        assert!(legacy_visible_to(&json!({"storeId": "s1"}), "s1"));
        assert!(legacy_visible_to(&json!({"lojaId": "s1"}), "s1"));
        assert!(legacy_visible_to(&json!({}), "s1"));
        assert!(!legacy_visible_to(&json!({"lojaId": "s2"}), "s1"));
        // storeId wins over lojaId
        assert!(!legacy_visible_to(&json!({"storeId": "s2", "lojaId": "s1"}), "s1"));
    }

    #[tokio::test]
    async fn test_missing_composition_is_no_result() {
        let (_store, strategy) = setup().await;
        let mut ctx = ResolutionContext::new("s1", "nope", None);
        assert!(strategy.attempt(&mut ctx).await.unwrap().is_none());
    }
}
