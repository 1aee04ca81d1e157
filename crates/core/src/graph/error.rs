//! Error types for the graph module.

use thiserror::Error;

/// Errors that can occur while building the route graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A catalog format cannot become a graph node.
    #[error("Handler \"{handler}\" declares a malformed format at position {position}: {reason}")]
    MalformedFormat {
        handler: String,
        position: usize,
        reason: String,
    },
}
