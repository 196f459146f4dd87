//! Generation-job lookup by composition back-reference

use super::composition::follow_composition;
use super::ResolutionStrategy;
use crate::resolver::context::ResolutionContext;
use crate::resolver::fields::{GenerationJob, COMPOSITION_REF};
use crate::store::{DocumentStore, FieldFilter, Scope, StoreError, GENERATION_JOBS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Maximum jobs read for one composition
const JOBS_PER_COMPOSITION: usize = 20;

/// Resolve one job: its own embedded products first, then the composition it points at
///
/// Bare ids found on the job are queued either way, before anything is returned.
pub(crate) async fn resolve_job(
    store: &dyn DocumentStore,
    ctx: &mut ResolutionContext,
    job: GenerationJob,
) -> Result<Option<Vec<Value>>, StoreError> {
    ctx.collect_ids(job.refs.ids);

    if !job.refs.embedded.is_empty() {
        tracing::debug!(job_id = %job.id, "Generation job embeds products");
        return Ok(Some(job.refs.embedded));
    }

    if let Some(composition_id) = job.composition_id {
        tracing::debug!(
            job_id = %job.id,
            referenced = %composition_id,
            "Following generation job to its composition"
        );
        return follow_composition(store, ctx, &composition_id).await;
    }

    Ok(None)
}

/// Strategy: jobs whose `compositionId` is the target
pub struct JobByComposition {
    store: Arc<dyn DocumentStore>,
}

impl JobByComposition {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolutionStrategy for JobByComposition {
    fn name(&self) -> &'static str {
        "generation_job"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        for key in COMPOSITION_REF {
            let filters = [
                FieldFilter::eq("storeId", ctx.store_id.as_str()),
                FieldFilter::eq(*key, ctx.composition_id.as_str()),
            ];
            let jobs = self
                .store
                .query(GENERATION_JOBS, Scope::Global, &filters, JOBS_PER_COMPOSITION)
                .await?;

            for doc in &jobs {
                if let Some(found) = resolve_job(self.store.as_ref(), ctx, GenerationJob::from(doc)).await? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteDocumentStore, COMPOSITIONS};
    use serde_json::json;
    use vitrine_common::db::init_memory_pool;

    async fn setup() -> (SqliteDocumentStore, JobByComposition) {
        let store = SqliteDocumentStore::new(init_memory_pool().await.unwrap());
        let strategy = JobByComposition::new(Arc::new(store.clone()));
        (store, strategy)
    }

    #[tokio::test]
    async fn test_job_embedded_products() {
        let (store, strategy) = setup().await;
        store
            .insert(
                GENERATION_JOBS,
                Scope::Global,
                "j1",
                &json!({"storeId": "s1", "compositionId": "c1", "products": [{"id": "p1", "name": "Saia"}]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c1", None);
        let found = strategy.attempt(&mut ctx).await.unwrap().unwrap();
        assert_eq!(found[0]["name"], "Saia");
    }

    #[tokio::test]
    async fn test_job_of_other_store_ignored() {
        let (store, strategy) = setup().await;
        store
            .insert(
                GENERATION_JOBS,
                Scope::Global,
                "j1",
                &json!({"storeId": "s2", "compositionId": "c1", "products": [{"id": "p1", "name": "Saia"}]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c1", None);
        assert!(strategy.attempt(&mut ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_job_ids_collected() {
        let (store, strategy) = setup().await;
        store
            .insert(
                GENERATION_JOBS,
                Scope::Global,
                "j1",
                &json!({"storeId": "s1", "composicaoId": "c1", "productIds": ["p5"]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c1", None);
        assert!(strategy.attempt(&mut ctx).await.unwrap().is_none());
        assert_eq!(ctx.pending_ids(), ["p5"]);
    }

    #[tokio::test]
    async fn test_resolve_job_follows_reference() {
        let (store, _strategy) = setup().await;
        store
            .insert(
                COMPOSITIONS,
                Scope::Store("s1"),
                "c-real",
                &json!({"products": [{"id": "p2", "nome": "Blusa"}]}),
            )
            .await
            .unwrap();

        let job = GenerationJob::from(&crate::store::Document {
            id: "j9".to_string(),
            body: json!({"storeId": "s1", "compositionId": "c-real"}),
        });

        let mut ctx = ResolutionContext::new("s1", "c-target", None);
        let found = resolve_job(&store, &mut ctx, job).await.unwrap().unwrap();
        assert_eq!(found[0]["id"], "p2");
    }

    #[tokio::test]
    async fn test_job_ids_kept_alongside_embedded_products() {
        let (store, strategy) = setup().await;
        store
            .insert(
                GENERATION_JOBS,
                Scope::Global,
                "j1",
                &json!({"storeId": "s1", "compositionId": "c1", "products": [{"preco": 10}], "productIds": ["p7"]}),
            )
            .await
            .unwrap();

        let mut ctx = ResolutionContext::new("s1", "c1", None);
        let found = strategy.attempt(&mut ctx).await.unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(ctx.pending_ids(), ["p7"]);
    }
}
