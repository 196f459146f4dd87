//! Per-call resolution state shared along the strategy chain

use std::collections::HashSet;
use vitrine_common::Product;

/// State threaded through every strategy of one `resolve` call
///
/// Strategies that only find bare product ids park them here; the id
/// strategies later in the chain consume them.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub store_id: String,
    pub composition_id: String,
    pub image_url_hint: Option<String>,
    pending_ids: Vec<String>,
    seen_ids: HashSet<String>,
    prefetched: Vec<Product>,
    visited_compositions: HashSet<String>,
}

impl ResolutionContext {
    pub fn new(store_id: &str, composition_id: &str, image_url_hint: Option<&str>) -> Self {
        Self {
            store_id: store_id.to_string(),
            composition_id: composition_id.to_string(),
            image_url_hint: image_url_hint
                .map(str::trim)
                .filter(|hint| !hint.is_empty())
                .map(str::to_string),
            pending_ids: Vec::new(),
            seen_ids: HashSet::new(),
            prefetched: Vec::new(),
            visited_compositions: HashSet::new(),
        }
    }

    /// Queue product ids for the id strategies; ids seen before are ignored
    pub fn collect_ids<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            if self.seen_ids.insert(id.clone()) {
                self.pending_ids.push(id);
            }
        }
    }

    /// Ids collected and not yet consumed
    pub fn pending_ids(&self) -> &[String] {
        &self.pending_ids
    }

    /// Consume pending ids together with any registry snapshots found for them
    pub fn take_pending(&mut self) -> (Vec<String>, Vec<Product>) {
        (
            std::mem::take(&mut self.pending_ids),
            std::mem::take(&mut self.prefetched),
        )
    }

    /// Keep partial registry hits for the catalog fetch to complete
    pub fn stash_prefetched(&mut self, products: Vec<Product>) {
        for product in products {
            if !self.prefetched.iter().any(|p| p.id == product.id) {
                self.prefetched.push(product);
            }
        }
    }

    /// Mark a composition as looked up; false if it already was
    pub fn visit_composition(&mut self, composition_id: &str) -> bool {
        self.visited_compositions.insert(composition_id.to_string())
    }
}
