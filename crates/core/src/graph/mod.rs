//! Route graph, route search and dead-end tracking.
//!
//! The [`RouteGraph`] has one node per MIME type and one weighted edge per
//! conversion a handler offers. [`RouteGraph::search`] lazily enumerates
//! candidate routes between two formats, cheapest first, skipping any route
//! that starts with a prefix registered in the [`DeadEndRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use chainconv_core::graph::{DeadEndRegistry, PathStep, RouteGraph, RoutingConfig, SearchMode};
//!
//! let graph = RouteGraph::build(&catalog, &registry, &RoutingConfig::default())?;
//! let dead_ends = DeadEndRegistry::new();
//!
//! for route in graph.search(start, goal, SearchMode::Simple, dead_ends.clone()) {
//!     if let Err(failed_prefix) = try_route(&route).await {
//!         // Prunes matching candidates of this very search
//!         dead_ends.record(failed_prefix);
//!     }
//! }
//! ```

mod builder;
mod config;
mod cost;
mod dead_end;
mod error;
mod search;
mod types;

pub use builder::{EdgeView, FormatRef, GraphEdge, GraphNode, GraphSnapshot, NodeView, RouteGraph};
pub use config::RoutingConfig;
pub use cost::{CategoryChangeCost, CostModel};
pub use dead_end::DeadEndRegistry;
pub use error::GraphError;
pub use search::RouteSearch;
pub use types::{PathStep, Route, SearchMode};
