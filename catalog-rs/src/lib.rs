//! catalog-rs library - Regional Sync module
//!
//! Keeps the local `regional` table consistent with the regional list of an
//! external system of record, preserving history (no hard deletes), and
//! exposes the sync trigger and regional listings over HTTP.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::db::RegionalStore;
use crate::services::RegionalSyncService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Regional persistence
    pub store: Arc<dyn RegionalStore>,
    /// Reconciliation engine
    pub sync: Arc<RegionalSyncService>,
}

impl AppState {
    pub fn new(store: Arc<dyn RegionalStore>, sync: Arc<RegionalSyncService>) -> Self {
        Self { store, sync }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::regional_routes())
        .merge(api::admin_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
