//! Route graph API handlers.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

/// Query parameters for the graph view
#[derive(Debug, Default, Deserialize)]
pub struct GraphParams {
    /// Return the plain-text adjacency listing instead of JSON.
    #[serde(default)]
    pub text: bool,
}

/// GET /api/v1/graph
///
/// Snapshot of the current route graph.
pub async fn get_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    let engine = state.engine().read().await;

    if params.text {
        return (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            engine.graph().describe(),
        )
            .into_response();
    }

    Json(engine.graph().snapshot()).into_response()
}
