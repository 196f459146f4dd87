//! Resolution strategies
//!
//! Each strategy tries one resolution path against one data source. The
//! orchestrator runs them in a fixed order and stops at the first one that
//! yields products.
//!
//! | Strategy | Source |
//! |---|---|
//! | `composition_embedded` | composition record (per-store, then legacy flat) |
//! | `generation_job` | generation jobs pointing at the composition |
//! | `registry_ids` | registry snapshots for collected ids |
//! | `catalog_ids` | catalog records for collected ids |
//! | `generation_job_image` | generation jobs matched by image URL |
//! | `composition_image_scan` | compositions matched by image URL |

mod catalog;
mod composition;
mod generation_job;
mod image_scan;
mod registry_ids;

pub use catalog::CatalogIds;
pub use composition::CompositionLookup;
pub use generation_job::JobByComposition;
pub use image_scan::{CompositionImageScan, JobByImageUrl};
pub use registry_ids::RegistryIds;

use super::context::ResolutionContext;
use crate::store::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// One resolution path
///
/// `Ok(None)` means "no result here"; the orchestrator moves on. Errors are
/// logged and treated the same way unless the store is unavailable.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Tag recorded as the resolution source
    fn name(&self) -> &'static str;

    /// Try to produce raw product-like records
    async fn attempt(&self, ctx: &mut ResolutionContext) -> Result<Option<Vec<Value>>, StoreError>;
}
