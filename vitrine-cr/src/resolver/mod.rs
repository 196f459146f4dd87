//! Composition product resolution
//!
//! `CompositionResolver::resolve` turns a composition id into the catalog
//! products it depicts:
//!
//! 1. Registry snapshot for the composition, if any (tagged `registry`)
//! 2. Strategy chain in fixed order, stopping at the first strategy whose
//!    records survive validation
//! 3. Placeholder products when every strategy comes up empty (tagged `fallback`)
//!
//! Results from steps 2 and 3 are written back to the registry so the next
//! call for the same composition is a single lookup.

pub mod context;
pub mod fallback;
pub mod fields;
pub mod normalize;
pub mod strategies;
pub mod validate;

use crate::favorites::FavoritesLookup;
use crate::registry::{RegistryIndex, FALLBACK_SOURCE};
use crate::store::{DocumentStore, StoreError};
use context::ResolutionContext;
use std::sync::Arc;
use std::time::Duration;
use strategies::{
    CatalogIds, CompositionImageScan, CompositionLookup, JobByComposition, JobByImageUrl,
    RegistryIds, ResolutionStrategy,
};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;
use vitrine_common::config::ResolverConfig;
use vitrine_common::Product;

/// Source tag for answers served from the registry
pub const REGISTRY_SOURCE: &str = "registry";

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Maximum records read by one image-URL scan
    pub scan_limit: usize,
    /// Budget for a single strategy attempt
    pub strategy_timeout: Duration,
    /// Parallel catalog fetches
    pub fetch_concurrency: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for ResolverSettings {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            scan_limit: config.scan_limit,
            strategy_timeout: config.strategy_timeout(),
            fetch_concurrency: config.fetch_concurrency,
        }
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub products: Vec<Product>,
    /// Strategy name, `registry` or `fallback`
    pub source: String,
}

/// Failure surfaced to the caller
///
/// Not-found never shows up here; only the data store going away does.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Data store unavailable: {0}")]
    Unavailable(StoreError),
}

/// Resolves compositions to products
pub struct CompositionResolver {
    registry: Arc<dyn RegistryIndex>,
    favorites: Arc<dyn FavoritesLookup>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    settings: ResolverSettings,
}

impl CompositionResolver {
    /// Resolver with the standard strategy chain
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn RegistryIndex>,
        favorites: Arc<dyn FavoritesLookup>,
        settings: ResolverSettings,
    ) -> Self {
        let strategies = default_strategies(&store, &registry, &settings);
        Self::with_strategies(registry, favorites, strategies, settings)
    }

    /// Resolver with a custom strategy chain
    pub fn with_strategies(
        registry: Arc<dyn RegistryIndex>,
        favorites: Arc<dyn FavoritesLookup>,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            registry,
            favorites,
            strategies,
            settings,
        }
    }

    /// Names of the configured strategies, in run order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve a composition to its products
    ///
    /// Always returns at least one product unless the store is unavailable.
    pub async fn resolve(
        &self,
        store_id: &str,
        composition_id: &str,
        image_url_hint: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let span = tracing::info_span!(
            "resolve",
            request_id = %Uuid::new_v4(),
            store_id,
            composition_id
        );
        self.resolve_inner(store_id, composition_id, image_url_hint)
            .instrument(span)
            .await
    }

    async fn resolve_inner(
        &self,
        store_id: &str,
        composition_id: &str,
        image_url_hint: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        if let Some(products) = self.registry_lookup(store_id, composition_id).await? {
            tracing::info!(count = products.len(), source = REGISTRY_SOURCE, "Resolved composition");
            return Ok(Resolution {
                products,
                source: REGISTRY_SOURCE.to_string(),
            });
        }

        let mut ctx = ResolutionContext::new(store_id, composition_id, image_url_hint);

        for strategy in &self.strategies {
            let Some(raw) = self.run_strategy(strategy.as_ref(), &mut ctx).await? else {
                continue;
            };

            let products = validate::normalize_products(&raw);
            if products.is_empty() {
                tracing::warn!(
                    strategy = strategy.name(),
                    records = raw.len(),
                    "Strategy records failed validation"
                );
                continue;
            }

            tracing::info!(count = products.len(), source = strategy.name(), "Resolved composition");
            self.persist(store_id, composition_id, &products, strategy.name()).await;
            return Ok(Resolution {
                products,
                source: strategy.name().to_string(),
            });
        }

        let name_hint = self.name_hint(store_id, composition_id).await;
        let products = fallback::synthesize(composition_id, name_hint.as_deref(), ctx.image_url_hint.as_deref());
        tracing::info!(
            count = products.len(),
            source = FALLBACK_SOURCE,
            named = name_hint.is_some(),
            "No strategy resolved composition, using placeholders"
        );
        self.persist(store_id, composition_id, &products, FALLBACK_SOURCE).await;

        Ok(Resolution {
            products,
            source: FALLBACK_SOURCE.to_string(),
        })
    }

    /// Registry snapshot for the composition; data errors count as a miss
    async fn registry_lookup(
        &self,
        store_id: &str,
        composition_id: &str,
    ) -> Result<Option<Vec<Product>>, ResolveError> {
        match self.registry.get_by_composition_id(store_id, composition_id).await {
            Ok(Some(entry)) if !entry.products.is_empty() => Ok(Some(entry.products)),
            Ok(_) => Ok(None),
            Err(e) if e.is_unavailable() => {
                tracing::error!(error = %e, "Registry unavailable");
                Err(ResolveError::Unavailable(e))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registry lookup failed, resolving from scratch");
                Ok(None)
            }
        }
    }

    /// One strategy attempt under the configured timeout
    async fn run_strategy(
        &self,
        strategy: &dyn ResolutionStrategy,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Vec<serde_json::Value>>, ResolveError> {
        let name = strategy.name();
        match tokio::time::timeout(self.settings.strategy_timeout, strategy.attempt(ctx)).await {
            Ok(Ok(Some(raw))) if !raw.is_empty() => Ok(Some(raw)),
            Ok(Ok(_)) => {
                tracing::debug!(strategy = name, "No result");
                Ok(None)
            }
            Ok(Err(e)) if e.is_unavailable() => {
                tracing::error!(strategy = name, error = %e, "Data store unavailable");
                Err(ResolveError::Unavailable(e))
            }
            Ok(Err(e)) => {
                tracing::warn!(strategy = name, error = %e, "Strategy failed, skipping");
                Ok(None)
            }
            Err(_) => {
                tracing::warn!(
                    strategy = name,
                    timeout_ms = self.settings.strategy_timeout.as_millis() as u64,
                    "Strategy timed out, skipping"
                );
                Ok(None)
            }
        }
    }

    async fn name_hint(&self, store_id: &str, composition_id: &str) -> Option<String> {
        match self.favorites.find_product_name_hint(store_id, composition_id).await {
            Ok(hint) => hint,
            Err(e) => {
                tracing::warn!(error = %e, "Favorites lookup failed");
                None
            }
        }
    }

    /// Write-through to the registry; failures never fail the call
    async fn persist(&self, store_id: &str, composition_id: &str, products: &[Product], source: &str) {
        if let Err(e) = self
            .registry
            .put_by_composition_id(store_id, composition_id, products, source)
            .await
        {
            tracing::warn!(error = %e, source, "Failed to write registry entry");
        }
    }
}

/// The standard chain
///
/// The id strategies run twice: once for ids found through the composition
/// and its jobs, and again for ids found by the image scans. The second pair
/// is a no-op when nothing new was collected.
fn default_strategies(
    store: &Arc<dyn DocumentStore>,
    registry: &Arc<dyn RegistryIndex>,
    settings: &ResolverSettings,
) -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(CompositionLookup::new(store.clone())),
        Box::new(JobByComposition::new(store.clone())),
        Box::new(RegistryIds::new(registry.clone())),
        Box::new(CatalogIds::new(store.clone(), settings.fetch_concurrency)),
        Box::new(JobByImageUrl::new(store.clone(), settings.scan_limit)),
        Box::new(CompositionImageScan::new(store.clone(), settings.scan_limit)),
        Box::new(RegistryIds::new(registry.clone())),
        Box::new(CatalogIds::new(store.clone(), settings.fetch_concurrency)),
    ]
}
