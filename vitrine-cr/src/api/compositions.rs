//! Composition product endpoints
//!
//! - `GET /api/compositions/:composition_id/products?storeId=&imageUrl=`
//! - `DELETE /api/compositions/:composition_id/registry?storeId=`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vitrine_common::Product;

use crate::{ApiError, ApiResult, AppState};

/// Query parameters for the products endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub store_id: Option<String>,
    #[serde(default, alias = "imageUrlHint")]
    pub image_url: Option<String>,
}

/// Query parameters for the registry endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryQuery {
    pub store_id: Option<String>,
}

/// Non-blank `storeId`, or 400
fn required_store_id(store_id: Option<&str>) -> ApiResult<&str> {
    store_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("storeId is required".to_string()))
}

/// Products endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    /// Strategy that produced the products (`registry`, `fallback`, ...)
    pub source: String,
}

/// GET /api/compositions/:composition_id/products
pub async fn get_composition_products(
    State(state): State<AppState>,
    Path(composition_id): Path<String>,
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Json<ProductsResponse>> {
    let store_id = required_store_id(query.store_id.as_deref())?;

    let composition_id = composition_id.trim();
    if composition_id.is_empty() {
        return Err(ApiError::BadRequest("compositionId is required".to_string()));
    }

    let resolution = state
        .resolver
        .resolve(store_id, composition_id, query.image_url.as_deref())
        .await?;

    Ok(Json(ProductsResponse {
        products: resolution.products,
        source: resolution.source,
    }))
}

/// DELETE /api/compositions/:composition_id/registry
///
/// Drops the store's registry entry so the next request resolves from scratch.
pub async fn delete_registry_entry(
    State(state): State<AppState>,
    Path(composition_id): Path<String>,
    Query(query): Query<RegistryQuery>,
) -> ApiResult<StatusCode> {
    let store_id = required_store_id(query.store_id.as_deref())?;
    let removed = state.registry.remove(store_id, &composition_id).await?;
    tracing::info!(store_id, composition_id = %composition_id, removed, "Registry entry cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Build composition routes
pub fn composition_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/compositions/:composition_id/products",
            get(get_composition_products),
        )
        .route(
            "/api/compositions/:composition_id/registry",
            delete(delete_registry_entry),
        )
}
