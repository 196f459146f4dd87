//! Document store collaborator
//!
//! The resolver treats its data source as an abstract collection store:
//! get-by-id within a per-store or flat collection, equality-filtered queries
//! with a result cap, and batch get-by-id-list. Absence is `Ok(None)` or an
//! empty vector, never an error.

pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use sqlite::SqliteDocumentStore;

/// Per-store and legacy flat composition collection
pub const COMPOSITIONS: &str = "compositions";
/// Flat generation-job collection (records carry `storeId`)
pub const GENERATION_JOBS: &str = "generation_jobs";
/// Per-store product catalog
pub const PRODUCTS: &str = "products";
/// Flat customer favorites collection (records carry `storeId`)
pub const FAVORITES: &str = "favorites";

/// Where a collection lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Sub-collection owned by one store
    Store(&'a str),
    /// Flat top-level collection
    Global,
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Store(store_id) => write!(f, "store:{}", store_id),
            Scope::Global => write!(f, "global"),
        }
    }
}

/// Equality filter on a top-level document field
///
/// A `None` value matches documents where the field is absent or null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Option<String>,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Some(value.into()),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
        }
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Store unreachable (connection, pool, I/O). The only infrastructure-class error.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Query rejected or failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Stored document could not be decoded
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl StoreError {
    /// True for errors that mean the store itself is down
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Abstract key/collection store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id
    async fn get(
        &self,
        collection: &str,
        scope: Scope<'_>,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Equality-filtered query returning at most `limit` documents, newest first
    ///
    /// An empty filter list scans the collection.
    async fn query(
        &self,
        collection: &str,
        scope: Scope<'_>,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Batch fetch by id list; missing ids are omitted, order follows `ids`
    async fn get_many(
        &self,
        collection: &str,
        scope: Scope<'_>,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError>;
}
