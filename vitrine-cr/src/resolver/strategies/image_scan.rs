//! Bounded image-URL scans over generation jobs and compositions
//!
//! Both scans read at most `scan_limit` records per call. Records are ranked
//! by match tier (exact, canonical, filename) and, within a tier, by scan
//! order; the first record that yields products or ids wins.

use super::composition::{legacy_owner_filters, legacy_visible_to};
use super::generation_job::resolve_job;
use super::ResolutionStrategy;
use crate::resolver::context::ResolutionContext;
use crate::resolver::fields::{Composition, GenerationJob};
use crate::resolver::normalize::{best_match, MatchTier};
use crate::store::{DocumentStore, FieldFilter, Scope, StoreError, COMPOSITIONS, GENERATION_JOBS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Records matching `hint`, strongest tier first, scan order within a tier
fn rank_matches<T>(hint: &str, records: Vec<T>, urls: impl Fn(&T) -> &[String]) -> Vec<(MatchTier, T)> {
    let mut matched: Vec<(MatchTier, T)> = records
        .into_iter()
        .filter_map(|record| {
            let tier = best_match(hint, urls(&record).iter().map(String::as_str))?;
            Some((tier, record))
        })
        .collect();
    // Stable sort keeps scan order within a tier
    matched.sort_by_key(|(tier, _)| *tier);
    matched
}

/// Strategy: generation jobs whose image matches the hint
pub struct JobByImageUrl {
    store: Arc<dyn DocumentStore>,
    scan_limit: usize,
}

impl JobByImageUrl {
    pub fn new(store: Arc<dyn DocumentStore>, scan_limit: usize) -> Self {
        Self { store, scan_limit }
    }
}

#[async_trait]
impl ResolutionStrategy for JobByImageUrl {
    fn name(&self) -> &'static str {
        "generation_job_image"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        let Some(hint) = ctx.image_url_hint.clone() else {
            return Ok(None);
        };

        let filters = [FieldFilter::eq("storeId", ctx.store_id.as_str())];
        let docs = self
            .store
            .query(GENERATION_JOBS, Scope::Global, &filters, self.scan_limit)
            .await?;
        let scanned = docs.len();

        let jobs: Vec<GenerationJob> = docs.iter().map(GenerationJob::from).collect();
        let matches = rank_matches(&hint, jobs, |job| job.image_urls.as_slice());
        tracing::debug!(scanned, matched = matches.len(), "Scanned generation jobs by image URL");

        for (tier, job) in matches {
            tracing::debug!(job_id = %job.id, tier = tier.as_str(), "Generation job image matches hint");
            let pending_before = ctx.pending_ids().len();
            if let Some(found) = resolve_job(self.store.as_ref(), ctx, job).await? {
                return Ok(Some(found));
            }
            if ctx.pending_ids().len() > pending_before {
                // Ids from this job go to the id strategies
                return Ok(None);
            }
        }
        Ok(None)
    }
}

/// Strategy: last-resort scan of composition records by image
pub struct CompositionImageScan {
    store: Arc<dyn DocumentStore>,
    scan_limit: usize,
}

impl CompositionImageScan {
    pub fn new(store: Arc<dyn DocumentStore>, scan_limit: usize) -> Self {
        Self { store, scan_limit }
    }

    /// Per-store compositions first, then legacy flat ones, sharing one cap
    ///
    /// Legacy records follow the same ownership rule as the direct lookup.
    async fn scan(&self, store_id: &str) -> Result<Vec<Composition>, StoreError> {
        let mut docs = self
            .store
            .query(COMPOSITIONS, Scope::Store(store_id), &[], self.scan_limit)
            .await?;

        for filters in legacy_owner_filters(store_id) {
            let remaining = self.scan_limit.saturating_sub(docs.len());
            if remaining == 0 {
                break;
            }
            let legacy = self
                .store
                .query(COMPOSITIONS, Scope::Global, &filters, remaining)
                .await?;
            docs.extend(legacy.into_iter().filter(|doc| legacy_visible_to(&doc.body, store_id)));
        }

        Ok(docs.iter().map(Composition::from).collect())
    }
}

#[async_trait]
impl ResolutionStrategy for CompositionImageScan {
    fn name(&self) -> &'static str {
        "composition_image_scan"
    }

    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError> {
        let Some(hint) = ctx.image_url_hint.clone() else {
            return Ok(None);
        };

        let compositions = self.scan(&ctx.store_id).await?;
        let scanned = compositions.len();
        let matches = rank_matches(&hint, compositions, |c| c.image_urls.as_slice());
        tracing::debug!(scanned, matched = matches.len(), "Scanned compositions by image URL");

        for (tier, composition) in matches {
            tracing::debug!(
                matched_composition = %composition.id,
                tier = tier.as_str(),
                "Composition image matches hint"
            );
            if composition.refs.embedded.is_empty() && composition.refs.ids.is_empty() {
                continue;
            }
            ctx.visit_composition(&composition.id);
            ctx.collect_ids(composition.refs.ids);
            if composition.refs.embedded.is_empty() {
                return Ok(None);
            }
            return Ok(Some(composition.refs.embedded));
        }
        Ok(None)
    }
}
