//! # Vitrine Common Library
//!
//! Shared code for the Vitrine storefront services including:
//! - Error types
//! - Bootstrap configuration loading
//! - Database pool initialization and schema
//! - Catalog product shape

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::Product;
