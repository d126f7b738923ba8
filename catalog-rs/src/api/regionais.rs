//! Regional endpoints
//!
//! - `POST /admin/regionais/sync` runs a sync and returns the report
//! - `GET /api/regionais` lists active regionals, paginated
//! - `GET /api/regionais/:id` returns one regional, active or retired
//! - `GET /api/regionais/external` fetches the external list, syncs it and
//!   returns both

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::models::{ExternalRegionalRecord, Regional, SyncReport};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Regional as exposed over HTTP
#[derive(Debug, Serialize)]
pub struct RegionalDto {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub nome: String,
    pub ativo: bool,
    pub created_at: String,
}

impl From<Regional> for RegionalDto {
    fn from(r: Regional) -> Self {
        Self {
            id: r.id,
            external_id: r.external_id,
            nome: r.name,
            ativo: r.active,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Query parameters for listing
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// One page of active regionals
#[derive(Debug, Serialize)]
pub struct RegionalPage {
    pub content: Vec<RegionalDto>,
    pub page: i64,
    pub page_size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

/// Response of `GET /api/regionais/external`
#[derive(Debug, Serialize)]
pub struct ExternalSyncResponse {
    pub mensagem: String,
    pub inseridas: u64,
    pub inativadas: u64,
    pub externas: Vec<ExternalRegionalRecord>,
}

/// GET /api/regionais
pub async fn list_regionais(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<RegionalPage>> {
    let total_elements = state.store.count_active().await?;
    let pagination = calculate_pagination(total_elements, query.page);

    let content = state
        .store
        .list_active(PAGE_SIZE, pagination.offset)
        .await?
        .into_iter()
        .map(RegionalDto::from)
        .collect();

    Ok(Json(RegionalPage {
        content,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_elements,
        total_pages: pagination.total_pages,
    }))
}

/// GET /api/regionais/:id
pub async fn get_regional(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RegionalDto>> {
    state
        .store
        .find_by_id(id)
        .await?
        .map(|r| Json(RegionalDto::from(r)))
        .ok_or_else(|| ApiError::NotFound(format!("regional {}", id)))
}

/// POST /admin/regionais/sync
pub async fn sync_regionais(State(state): State<AppState>) -> ApiResult<Json<SyncReport>> {
    let report = state.sync.sync().await?;
    Ok(Json(report))
}

/// GET /api/regionais/external
///
/// A fetch failure is reported as a regular API error. Once the list is in
/// hand, a failed sync still returns the list, with a failure message and a
/// 500 status.
pub async fn external_regionais(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<ExternalSyncResponse>)> {
    let externas = state.sync.source().fetch_all().await?;

    match state.sync.reconcile(externas.clone()).await {
        Ok(report) => Ok((
            StatusCode::OK,
            Json(ExternalSyncResponse {
                mensagem: format!(
                    "Sincronização concluída: {} inseridas, {} inativadas",
                    report.inserted_count(),
                    report.retired_count()
                ),
                inseridas: report.inserted_count(),
                inativadas: report.retired_count(),
                externas,
            }),
        )),
        Err(e) => {
            error!("Regional sync failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExternalSyncResponse {
                    mensagem: format!("Falha na sincronização: {}", e),
                    inseridas: 0,
                    inativadas: 0,
                    externas,
                }),
            ))
        }
    }
}

/// Public regional routes
pub fn regional_routes() -> Router<AppState> {
    Router::new()
        .route("/api/regionais", get(list_regionais))
        .route("/api/regionais/external", get(external_regionais))
        .route("/api/regionais/:id", get(get_regional))
}

/// Administrative routes
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/regionais/sync", post(sync_regionais))
}
