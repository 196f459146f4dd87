//! HTTP API handlers for vitrine-cr

pub mod compositions;
pub mod health;

pub use compositions::composition_routes;
pub use health::health_routes;
