//! vitrine-cr library interface
//!
//! Resolves look compositions to the catalog products they depict. Exposed as
//! a library so the HTTP router and the resolver can be driven from tests.

pub mod api;
pub mod error;
pub mod favorites;
pub mod registry;
pub mod resolver;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use registry::RegistryIndex;
use resolver::CompositionResolver;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CompositionResolver>,
    /// Registry handle for corrections
    pub registry: Arc<dyn RegistryIndex>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(resolver: Arc<CompositionResolver>, registry: Arc<dyn RegistryIndex>) -> Self {
        Self {
            resolver,
            registry,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::composition_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
