//! Route engine: handlers, their cached capabilities and the route graph.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::format::{CapabilityCatalog, FileFormat};
use crate::graph::{
    DeadEndRegistry, GraphError, PathStep, RouteGraph, RouteSearch, RoutingConfig, SearchMode,
};
use crate::handler::HandlerRegistry;
use crate::metrics;

/// Which side of a conversion a step describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The format a conversion starts from; must be readable.
    Input,
    /// The format a conversion ends with; must be writable.
    Output,
}

/// A format reference as given by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepQuery {
    pub mime: String,
    /// Short format id, for MIME types declared under several ids.
    #[serde(default)]
    pub format: Option<String>,
    /// Handler the format should come from.
    #[serde(default)]
    pub handler: Option<String>,
}

impl StepQuery {
    pub fn mime(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            format: None,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn matches(&self, format: &FileFormat, direction: Direction) -> bool {
        let usable = match direction {
            Direction::Input => format.from,
            Direction::Output => format.to,
        };
        usable
            && format.mime == self.mime
            && self.format.as_ref().is_none_or(|id| &format.format == id)
    }
}

/// Owns everything a route search needs.
///
/// The catalog is only filled by [`refresh`](Self::refresh); the graph is
/// rebuilt explicitly after the catalog changes.
#[derive(Debug)]
pub struct RouteEngine {
    registry: HandlerRegistry,
    catalog: CapabilityCatalog,
    config: RoutingConfig,
    graph: RouteGraph,
    dead_ends: DeadEndRegistry,
}

impl RouteEngine {
    /// Creates an engine with an empty catalog and graph.
    pub fn new(registry: HandlerRegistry, config: RoutingConfig) -> Self {
        Self {
            registry,
            catalog: CapabilityCatalog::new(),
            config,
            graph: RouteGraph::default(),
            dead_ends: DeadEndRegistry::with_gauge(metrics::DEAD_ENDS_ACTIVE.clone()),
        }
    }

    /// Creates an engine from a previously saved catalog and builds its graph.
    pub fn with_catalog(
        registry: HandlerRegistry,
        catalog: CapabilityCatalog,
        config: RoutingConfig,
    ) -> Result<Self, GraphError> {
        let mut engine = Self::new(registry, config);
        engine.catalog = catalog;
        engine.rebuild()?;
        Ok(engine)
    }

    /// Initializes uncached handlers and rebuilds the graph.
    pub async fn refresh(&mut self) -> Result<(), GraphError> {
        self.catalog.populate(&self.registry).await;
        info!(
            "Capability catalog holds {} handlers with {} formats",
            self.catalog.len(),
            self.catalog.format_count()
        );
        self.rebuild()
    }

    /// Drops the cached formats of one handler. Takes effect on the next
    /// [`refresh`](Self::refresh).
    pub fn invalidate(&mut self, handler: &str) -> bool {
        let removed = self.catalog.invalidate(handler);
        if removed {
            debug!("Invalidated cached formats of \"{}\"", handler);
        }
        removed
    }

    /// Drops every cached format.
    pub fn invalidate_all(&mut self) {
        self.catalog.clear();
    }

    /// Rebuilds the graph from the current catalog.
    pub fn rebuild(&mut self) -> Result<(), GraphError> {
        self.graph = RouteGraph::build(&self.catalog, &self.registry, &self.config)?;
        Ok(())
    }

    /// Searches the current graph using the engine's dead-end registry.
    pub fn search(&self, start: PathStep, goal: PathStep, mode: SearchMode) -> RouteSearch<'_> {
        self.graph.search(start, goal, mode, self.dead_ends.clone())
    }

    pub fn record_dead_end(&self, prefix: Vec<PathStep>) {
        self.dead_ends.record(prefix);
    }

    pub fn clear_dead_ends(&self) {
        self.dead_ends.clear();
    }

    pub fn dead_ends(&self) -> &DeadEndRegistry {
        &self.dead_ends
    }

    /// Builds a path step from catalog data.
    ///
    /// With a handler, only that handler's formats are considered. Without
    /// one, the first matching format in priority order is used and the step
    /// carries no handler.
    pub fn resolve_step(&self, query: &StepQuery, direction: Direction) -> Option<PathStep> {
        match &query.handler {
            Some(name) => {
                let handler = self.registry.get(name)?;
                let format = self
                    .catalog
                    .formats_of(name)?
                    .iter()
                    .find(|f| query.matches(f, direction))?;
                Some(PathStep::new(Some(handler.clone()), format.clone()))
            }
            None => self
                .catalog
                .entries()
                .flat_map(|e| e.formats.iter())
                .find(|f| query.matches(f, direction))
                .map(|f| PathStep::origin(f.clone())),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn graph(&self) -> &RouteGraph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{gif, jpeg, png};
    use crate::testing::MockHandler;
    use std::sync::Arc;

    fn engine() -> (RouteEngine, Arc<MockHandler>) {
        let images = Arc::new(MockHandler::new("images").with_formats(vec![png(), jpeg().read_only()]));
        let registry = HandlerRegistry::new()
            .with(images.clone())
            .unwrap()
            .with(Arc::new(MockHandler::new("gifs").with_formats(vec![png(), gif()])))
            .unwrap();
        (RouteEngine::new(registry, RoutingConfig::default()), images)
    }

    #[tokio::test]
    async fn test_refresh_builds_graph() {
        let (mut engine, images) = engine();
        assert_eq!(engine.graph().node_count(), 0);

        engine.refresh().await.unwrap();
        assert_eq!(engine.catalog().len(), 2);
        assert_eq!(engine.graph().node_count(), 3);
        assert_eq!(images.init_count(), 1);

        // Cached handlers are not initialized again
        engine.refresh().await.unwrap();
        assert_eq!(images.init_count(), 1);

        assert!(engine.invalidate("images"));
        engine.refresh().await.unwrap();
        assert_eq!(images.init_count(), 2);
    }

    #[tokio::test]
    async fn test_search_jpeg_to_gif() {
        let (mut engine, _) = engine();
        engine.refresh().await.unwrap();

        let start = engine
            .resolve_step(&StepQuery::mime("image/jpeg"), Direction::Input)
            .unwrap();
        let goal = engine
            .resolve_step(&StepQuery::mime("image/gif"), Direction::Output)
            .unwrap();
        let route = engine.search(start, goal, SearchMode::Simple).next().unwrap();

        assert_eq!(route.format_chain(), "jpeg → png → gif");
    }

    #[tokio::test]
    async fn test_resolve_step_respects_direction_and_handler() {
        let (mut engine, _) = engine();
        engine.refresh().await.unwrap();

        // jpeg is read-only
        assert!(engine
            .resolve_step(&StepQuery::mime("image/jpeg"), Direction::Output)
            .is_none());

        let step = engine
            .resolve_step(
                &StepQuery::mime("image/png").with_handler("gifs"),
                Direction::Output,
            )
            .unwrap();
        assert_eq!(step.handler_name(), Some("gifs"));

        assert!(engine
            .resolve_step(
                &StepQuery::mime("image/gif").with_handler("images"),
                Direction::Output
            )
            .is_none());
        assert!(engine
            .resolve_step(
                &StepQuery::mime("image/png").with_format("apng"),
                Direction::Input
            )
            .is_none());
    }

    #[tokio::test]
    async fn test_dead_ends_shared_with_searches() {
        let (mut engine, _) = engine();
        engine.refresh().await.unwrap();
        let start = PathStep::origin(png());
        engine.record_dead_end(vec![start.clone()]);

        assert_eq!(engine.dead_ends().len(), 1);
        assert!(engine
            .search(start.clone(), PathStep::origin(gif()), SearchMode::Simple)
            .next()
            .is_none());

        engine.clear_dead_ends();
        assert!(engine
            .search(start, PathStep::origin(gif()), SearchMode::Simple)
            .next()
            .is_some());
    }

    #[test]
    fn test_with_catalog() {
        let registry = HandlerRegistry::new();
        let catalog = CapabilityCatalog::new().with("offline", vec![png(), jpeg()]);
        let engine = RouteEngine::with_catalog(registry, catalog, RoutingConfig::default()).unwrap();
        assert_eq!(engine.graph().edge_count(), 2);
    }
}
