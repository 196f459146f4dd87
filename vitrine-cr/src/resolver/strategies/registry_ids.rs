//! Registry batch fetch for collected product ids

use super::ResolutionStrategy;
use crate::registry::RegistryIndex;
use crate::resolver::context::ResolutionContext;
use crate::store::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Strategy: serve collected ids from registry snapshots
///
/// Succeeds only when every pending id has a snapshot for the same store. Partial hits are
/// stashed on the context and completed by the catalog fetch.
pub struct RegistryIds {
    registry: Arc<dyn RegistryIndex>,
}

impl RegistryIds {
    pub fn new(registry: Arc<dyn RegistryIndex>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ResolutionStrategy for RegistryIds {
    fn name(&self) -> &'static str {
        "registry_ids"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        if ctx.pending_ids().is_empty() {
            return Ok(None);
        }

        let hits = self.registry.get_by_ids(&ctx.store_id, ctx.pending_ids()).await?;
        if hits.is_empty() {
            return Ok(None);
        }

        if hits.len() < ctx.pending_ids().len() {
            tracing::debug!(
                found = hits.len(),
                wanted = ctx.pending_ids().len(),
                "Registry covers part of the collected ids"
            );
            ctx.stash_prefetched(hits);
            return Ok(None);
        }

        ctx.take_pending();
        let values = hits
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(Some(values))
    }
}
