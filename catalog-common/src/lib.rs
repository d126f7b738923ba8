//! # Catalog Common Library
//!
//! Shared code for the catalog microservices including:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Database initialization and schema migrations
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
