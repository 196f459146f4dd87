//! Favorites lookup
//!
//! Customers can favorite a generated look; the favorite record keeps the
//! product name shown at the time. The fallback synthesizer uses it as a
//! best-effort name hint.

use crate::resolver::fields::{first_string, COMPOSITION_REF, FAVORITE_PRODUCT_NAME};
use crate::store::{DocumentStore, FieldFilter, Scope, StoreError, FAVORITES};
use async_trait::async_trait;
use std::sync::Arc;

/// Maximum favorites read per lookup
const FAVORITES_LIMIT: usize = 50;

/// Favorites collaborator
#[async_trait]
pub trait FavoritesLookup: Send + Sync {
    /// Product name recorded on a favorite of this composition, if any
    async fn find_product_name_hint(
        &self,
        store_id: &str,
        composition_id: &str,
    ) -> Result<Option<String>, StoreError>;
}

/// Favorites read from the flat `favorites` collection
#[derive(Clone)]
pub struct DocumentFavorites {
    store: Arc<dyn DocumentStore>,
}

impl DocumentFavorites {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FavoritesLookup for DocumentFavorites {
    async fn find_product_name_hint(
        &self,
        store_id: &str,
        composition_id: &str,
    ) -> Result<Option<String>, StoreError> {
        for key in COMPOSITION_REF {
            let filters = [
                FieldFilter::eq("storeId", store_id),
                FieldFilter::eq(*key, composition_id),
            ];
            let favorites = self
                .store
                .query(FAVORITES, Scope::Global, &filters, FAVORITES_LIMIT)
                .await?;

            if let Some(name) = favorites
                .iter()
                .find_map(|doc| first_string(&doc.body, FAVORITE_PRODUCT_NAME))
            {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use serde_json::json;
    use vitrine_common::db::init_memory_pool;

    async fn setup() -> (SqliteDocumentStore, DocumentFavorites) {
        let store = SqliteDocumentStore::new(init_memory_pool().await.unwrap());
        let favorites = DocumentFavorites::new(Arc::new(store.clone()));
        (store, favorites)
    }

    #[tokio::test]
    async fn test_hint_found() {
        let (store, favorites) = setup().await;
        store
            .insert(
                FAVORITES,
                Scope::Global,
                "f1",
                &json!({"storeId": "s1", "compositionId": "c1", "produtoNome": "Vestido + Cinto"}),
            )
            .await
            .unwrap();

        let hint = favorites.find_product_name_hint("s1", "c1").await.unwrap();
        assert_eq!(hint.as_deref(), Some("Vestido + Cinto"));
    }

    #[tokio::test]
    async fn test_hint_scoped_to_store() {
        let (store, favorites) = setup().await;
        store
            .insert(
                FAVORITES,
                Scope::Global,
                "f1",
                &json!({"storeId": "other", "compositionId": "c1", "produtoNome": "Vestido"}),
            )
            .await
            .unwrap();

        assert!(favorites.find_product_name_hint("s1", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_favorite_without_name_is_skipped() {
        let (store, favorites) = setup().await;
        store
            .insert(FAVORITES, Scope::Global, "f1", &json!({"storeId": "s1", "composicaoId": "c1"}))
            .await
            .unwrap();
        store
            .insert(
                FAVORITES,
                Scope::Global,
                "f2",
                &json!({"storeId": "s1", "composicaoId": "c1", "productName": "Bolsa"}),
            )
            .await
            .unwrap();

        let hint = favorites.find_product_name_hint("s1", "c1").await.unwrap();
        assert_eq!(hint.as_deref(), Some("Bolsa"));
    }
}
