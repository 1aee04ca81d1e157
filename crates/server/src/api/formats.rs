//! Capability catalog API handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use chainconv_core::CatalogEntry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

/// Response for listing the catalog
#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub entries: Vec<CatalogEntry>,
    pub handlers: usize,
    pub formats: usize,
}

/// Query parameters for a refresh
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Drop the cached formats of this handler first.
    pub handler: Option<String>,
    /// Drop every cached format first.
    #[serde(default)]
    pub all: bool,
}

/// Response for a refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub handlers: usize,
    pub formats: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Whether the requested handler had cached formats to drop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidated: Option<bool>,
}

/// GET /api/v1/formats
///
/// List cached formats per handler, in priority order.
pub async fn list_formats(State(state): State<Arc<AppState>>) -> Json<FormatsResponse> {
    let engine = state.engine().read().await;
    let catalog = engine.catalog();

    Json(FormatsResponse {
        entries: catalog.entries().cloned().collect(),
        handlers: catalog.len(),
        formats: catalog.format_count(),
    })
}

/// POST /api/v1/refresh
///
/// Initialize handlers missing from the catalog and rebuild the route graph.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let mut engine = state.engine().write().await;

    // Reject unknown handlers before touching the catalog
    if let Some(name) = params.handler.as_deref() {
        if engine.registry().get(name).is_none() {
            return Err(ApiError::new(
                axum::http::StatusCode::NOT_FOUND,
                format!("Unknown handler: {}", name),
            ));
        }
    }

    if params.all {
        info!("Dropping all cached handler formats");
        engine.invalidate_all();
    }

    let invalidated = params.handler.as_deref().map(|name| engine.invalidate(name));

    engine.refresh().await?;

    Ok(Json(RefreshResponse {
        handlers: engine.catalog().len(),
        formats: engine.catalog().format_count(),
        nodes: engine.graph().node_count(),
        edges: engine.graph().edge_count(),
        invalidated,
    }))
}
