//! Route preview API handlers.

use axum::{extract::State, Json};
use chainconv_core::{DeadEndRegistry, Direction, PathStep, Route, RouteEngine, SearchMode, StepQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Maximum number of routes a preview may return
const MAX_LIMIT: usize = 100;

/// Default number of routes a preview returns
const DEFAULT_LIMIT: usize = 10;

/// Request body for a route preview
#[derive(Debug, Deserialize)]
pub struct RouteSearchBody {
    pub from: StepQuery,
    pub to: StepQuery,
    /// Defaults to `routing.default_mode`.
    pub mode: Option<SearchMode>,
    pub limit: Option<usize>,
}

/// A route as returned by the API
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub cost: f64,
    pub hops: usize,
    /// Short format ids joined by arrows.
    pub chain: String,
    pub steps: Vec<PathStep>,
}

impl From<Route> for RouteView {
    fn from(route: Route) -> Self {
        Self {
            cost: route.cost,
            hops: route.hops(),
            chain: route.format_chain(),
            steps: route.steps,
        }
    }
}

/// Response for a route preview
#[derive(Debug, Serialize)]
pub struct RouteSearchResponse {
    pub mode: SearchMode,
    pub routes: Vec<RouteView>,
    /// Whether the search had more routes than `limit`.
    pub truncated: bool,
}

/// Resolves both ends of a request against the engine's catalog.
pub(crate) fn resolve_endpoints(
    engine: &RouteEngine,
    from: &StepQuery,
    to: &StepQuery,
) -> Result<(PathStep, PathStep), ApiError> {
    let start = engine
        .resolve_step(from, Direction::Input)
        .ok_or_else(|| ApiError::bad_request(describe_missing(from, "read")))?;
    let goal = engine
        .resolve_step(to, Direction::Output)
        .ok_or_else(|| ApiError::bad_request(describe_missing(to, "write")))?;
    Ok((start, goal))
}

fn describe_missing(query: &StepQuery, verb: &str) -> String {
    match &query.handler {
        Some(handler) => format!("Handler \"{}\" cannot {} {}", handler, verb, query.mime),
        None => format!("No handler can {} {}", verb, query.mime),
    }
}

/// POST /api/v1/routes
///
/// List the cheapest routes between two formats without running them.
pub async fn search_routes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RouteSearchBody>,
) -> Result<Json<RouteSearchResponse>, ApiError> {
    let limit = body.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let engine = state.engine().read().await;
    let mode = body.mode.unwrap_or(engine.config().default_mode);
    let (start, goal) = resolve_endpoints(&engine, &body.from, &body.to)?;

    // Dead ends left over from the last conversion do not apply to previews
    let mut search = engine
        .graph()
        .search(start, goal, mode, DeadEndRegistry::new());
    let routes: Vec<RouteView> = search.by_ref().take(limit).map(RouteView::from).collect();
    let truncated = routes.len() == limit && search.next().is_some();

    Ok(Json(RouteSearchResponse {
        mode,
        routes,
        truncated,
    }))
}
