//! Route graph construction.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::RoutingConfig;
use super::cost::CostModel;
use super::dead_end::DeadEndRegistry;
use super::error::GraphError;
use super::search::RouteSearch;
use super::types::{PathStep, SearchMode};
use crate::format::{CapabilityCatalog, FileFormat};
use crate::handler::{HandlerRef, HandlerRegistry};
use crate::metrics;

/// A format as it appears at one end of an edge.
#[derive(Debug, Clone)]
pub struct FormatRef {
    pub format: Arc<FileFormat>,
    /// Index of the node for this format's MIME type.
    pub index: usize,
}

/// One node per distinct MIME type.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub mime: String,
    /// Indices of outgoing edges.
    pub edges: Vec<usize>,
}

/// A single conversion a handler can perform.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub from: FormatRef,
    pub to: FormatRef,
    pub handler_name: String,
    /// `None` when the catalog names a handler the registry doesn't have.
    pub handler: Option<HandlerRef>,
    pub cost: f64,
}

/// Weighted directed multigraph over MIME types.
///
/// Immutable once built; rebuild it after the catalog changes.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_index: HashMap<String, usize>,
    forbidden_chains: Vec<Vec<String>>,
    progress_log_interval: u64,
}

impl RouteGraph {
    /// Builds the graph from the catalog, in catalog order.
    ///
    /// The position of a handler in the catalog is its rank for the priority
    /// cost. Handler references are resolved against `registry` once here.
    pub fn build(
        catalog: &CapabilityCatalog,
        registry: &HandlerRegistry,
        config: &RoutingConfig,
    ) -> Result<Self, GraphError> {
        info!("Initializing route graph...");
        let start = Instant::now();

        let mut graph = RouteGraph {
            forbidden_chains: config.forbidden_chains.clone(),
            progress_log_interval: config.progress_log_interval.max(1),
            ..Default::default()
        };

        for (rank, entry) in catalog.entries().enumerate() {
            let handler = registry.get(&entry.handler).cloned();
            if handler.is_none() {
                warn!(
                    "Handler \"{}\" is in the catalog but not registered, its edges will be skipped",
                    entry.handler
                );
            }

            let mut readable = Vec::new();
            let mut writable = Vec::new();
            for (position, format) in entry.formats.iter().enumerate() {
                if format.mime.trim().is_empty() {
                    return Err(GraphError::MalformedFormat {
                        handler: entry.handler.clone(),
                        position,
                        reason: format!("format \"{}\" has no MIME type", format.format),
                    });
                }

                let format_ref = FormatRef {
                    format: Arc::new(format.clone()),
                    index: graph.node_for(&format.mime),
                };
                if format.from {
                    readable.push(format_ref.clone());
                }
                if format.to {
                    writable.push(format_ref);
                }
            }

            graph.connect(
                &entry.handler,
                handler.as_ref(),
                rank,
                &readable,
                &writable,
                &config.costs,
            );
        }

        info!(
            "Route graph initialized in {:.2} ms with {} nodes and {} edges",
            start.elapsed().as_secs_f64() * 1000.0,
            graph.nodes.len(),
            graph.edges.len()
        );
        metrics::GRAPH_BUILDS.inc();
        metrics::GRAPH_SIZE
            .with_label_values(&["nodes"])
            .set(graph.nodes.len() as i64);
        metrics::GRAPH_SIZE
            .with_label_values(&["edges"])
            .set(graph.edges.len() as i64);

        Ok(graph)
    }

    fn node_for(&mut self, mime: &str) -> usize {
        if let Some(&index) = self.node_index.get(mime) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(GraphNode {
            mime: mime.to_string(),
            edges: Vec::new(),
        });
        self.node_index.insert(mime.to_string(), index);
        index
    }

    fn connect(
        &mut self,
        handler_name: &str,
        handler: Option<&HandlerRef>,
        rank: usize,
        readable: &[FormatRef],
        writable: &[FormatRef],
        costs: &CostModel,
    ) {
        for from in readable {
            for to in writable {
                // No self-loops
                if from.index == to.index {
                    continue;
                }
                let cost = costs.edge_cost(&from.format, &to.format, rank);
                self.edges.push(GraphEdge {
                    from: from.clone(),
                    to: to.clone(),
                    handler_name: handler_name.to_string(),
                    handler: handler.cloned(),
                    cost,
                });
                let edge = self.edges.len() - 1;
                self.nodes[from.index].edges.push(edge);
            }
        }
        debug!(
            "Handler \"{}\" (rank {}) reads {} and writes {} formats",
            handler_name,
            rank,
            readable.len(),
            writable.len()
        );
    }

    /// Lazily enumerates routes from `start` to `goal` in ascending cost.
    pub fn search(
        &self,
        start: PathStep,
        goal: PathStep,
        mode: SearchMode,
        dead_ends: DeadEndRegistry,
    ) -> RouteSearch<'_> {
        RouteSearch::new(self, start, goal, mode, dead_ends)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_index(&self, mime: &str) -> Option<usize> {
        self.node_index.get(mime).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(super) fn progress_log_interval(&self) -> u64 {
        self.progress_log_interval
    }

    /// The first forbidden category chain `steps` contains, if any.
    pub fn forbidden_chain(&self, steps: &[PathStep]) -> Option<&[String]> {
        self.forbidden_chains
            .iter()
            .filter(|chain| !chain.is_empty())
            .find(|chain| {
                steps.windows(chain.len()).any(|window| {
                    window
                        .iter()
                        .zip(chain.iter())
                        .all(|(step, category)| step.format.has_category(category))
                })
            })
            .map(Vec::as_slice)
    }

    /// Textual dump of all nodes and edges.
    pub fn describe(&self) -> String {
        let mut output = String::from("Nodes:\n");
        for (index, node) in self.nodes.iter().enumerate() {
            let _ = writeln!(output, "{}: {}", index, node.mime);
        }
        output.push_str("Edges:\n");
        for (index, edge) in self.edges.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}: {} -> {} (handler: {}, cost: {})",
                index, edge.from.format.mime, edge.to.format.mime, edge.handler_name, edge.cost
            );
        }
        output
    }

    /// Serializable view of the graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes
                .iter()
                .enumerate()
                .map(|(index, node)| NodeView {
                    index,
                    mime: node.mime.clone(),
                    edges: node.edges.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .enumerate()
                .map(|(index, edge)| EdgeView {
                    index,
                    from: edge.from.index,
                    to: edge.to.index,
                    from_format: edge.from.format.format.clone(),
                    to_format: edge.to.format.format.clone(),
                    handler: edge.handler_name.clone(),
                    resolved: edge.handler.is_some(),
                    cost: edge.cost,
                })
                .collect(),
        }
    }
}

/// Serializable view of a [`RouteGraph`].
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub index: usize,
    pub mime: String,
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeView {
    pub index: usize,
    pub from: usize,
    pub to: usize,
    pub from_format: String,
    pub to_format: String,
    pub handler: String,
    pub resolved: bool,
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{format, gif, jpeg, mp4, png, wav};
    use crate::testing::MockHandler;

    fn registry(names: &[&str]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for name in names {
            registry.register(Arc::new(MockHandler::new(*name))).unwrap();
        }
        registry
    }

    #[test]
    fn test_nodes_are_unique_per_mime() {
        let catalog = CapabilityCatalog::new()
            .with("a", vec![png(), jpeg()])
            .with("b", vec![png(), gif()]);
        let graph =
            RouteGraph::build(&catalog, &registry(&["a", "b"]), &RoutingConfig::default()).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node_index("image/png"), Some(0));
        assert_eq!(graph.node_index("image/gif"), Some(2));
        // Two directions per handler
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_no_self_loops() {
        // Two short ids for the same MIME type
        let mov = format("mov", "video/mp4", "video", false);
        let catalog = CapabilityCatalog::new().with("a", vec![mp4(), mov, png()]);
        let graph = RouteGraph::build(&catalog, &registry(&["a"]), &RoutingConfig::default()).unwrap();

        assert!(graph.edge_count() > 0);
        assert!(graph.edges().iter().all(|e| e.from.index != e.to.index));
        assert!(graph
            .edges()
            .iter()
            .all(|e| e.from.format.mime != e.to.format.mime));
    }

    #[test]
    fn test_direction_flags() {
        let catalog = CapabilityCatalog::new().with("a", vec![png().read_only(), jpeg().write_only()]);
        let graph = RouteGraph::build(&catalog, &registry(&["a"]), &RoutingConfig::default()).unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.from.format.mime, "image/png");
        assert_eq!(edge.to.format.mime, "image/jpeg");
        assert_eq!(graph.nodes()[edge.from.index].edges, vec![0]);
    }

    #[test]
    fn test_priority_cost_by_catalog_order() {
        let catalog = CapabilityCatalog::new()
            .with("first", vec![jpeg().read_only(), png().write_only()])
            .with("second", vec![jpeg().read_only(), png().write_only()]);
        let graph =
            RouteGraph::build(&catalog, &registry(&["first", "second"]), &RoutingConfig::default())
                .unwrap();

        let costs: Vec<f64> = graph.edges().iter().map(|e| e.cost).collect();
        assert!((costs[0] - 1.0).abs() < 1e-9);
        assert!((costs[1] - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_costs_are_at_least_depth_cost() {
        let catalog = CapabilityCatalog::new().with("a", vec![png(), jpeg(), gif(), mp4(), wav()]);
        let graph = RouteGraph::build(&catalog, &registry(&["a"]), &RoutingConfig::default()).unwrap();

        assert!(graph.edges().iter().all(|e| e.cost >= 1.0));
    }

    #[test]
    fn test_unregistered_handler_edges_unresolved() {
        let catalog = CapabilityCatalog::new().with("ghost", vec![png(), jpeg()]);
        let graph = RouteGraph::build(&catalog, &registry(&[]), &RoutingConfig::default()).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges().iter().all(|e| e.handler.is_none()));
    }

    #[test]
    fn test_malformed_format_fails_build() {
        let catalog = CapabilityCatalog::new().with("a", vec![png(), FileFormat::new("bin", " ")]);
        let err = RouteGraph::build(&catalog, &registry(&["a"]), &RoutingConfig::default())
            .unwrap_err();

        match err {
            GraphError::MalformedFormat {
                handler, position, ..
            } => {
                assert_eq!(handler, "a");
                assert_eq!(position, 1);
            }
        }
    }

    #[test]
    fn test_forbidden_chain_detection() {
        let graph = RouteGraph::build(
            &CapabilityCatalog::new(),
            &HandlerRegistry::new(),
            &RoutingConfig::default(),
        )
        .unwrap();

        let triangle = vec![
            PathStep::origin(png()),
            PathStep::origin(mp4()),
            PathStep::origin(wav()),
        ];
        assert!(graph.forbidden_chain(&triangle).is_some());
        assert!(graph.forbidden_chain(&triangle[..2]).is_none());
        assert!(graph.forbidden_chain(&triangle[1..]).is_none());

        let detour = vec![
            PathStep::origin(png()),
            PathStep::origin(jpeg()),
            PathStep::origin(mp4()),
            PathStep::origin(wav()),
        ];
        // jpeg -> mp4 -> wav is still image -> video -> audio
        assert!(graph.forbidden_chain(&detour).is_some());
    }

    #[test]
    fn test_describe_and_snapshot() {
        let catalog = CapabilityCatalog::new().with("a", vec![png().read_only(), jpeg().write_only()]);
        let graph = RouteGraph::build(&catalog, &registry(&["a"]), &RoutingConfig::default()).unwrap();

        let text = graph.describe();
        assert!(text.contains("0: image/png"));
        assert!(text.contains("0: image/png -> image/jpeg (handler: a, cost: 1.4)"));

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges[0].handler, "a");
        assert!(snapshot.edges[0].resolved);
    }
}
