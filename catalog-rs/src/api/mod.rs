//! HTTP API handlers for catalog-rs

pub mod health;
pub mod regionais;

pub use health::health_routes;
pub use regionais::{admin_routes, regional_routes};
