//! Error types for the converter module.

use thiserror::Error;

/// Errors that end a conversion request.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Nothing to convert.
    #[error("No input files")]
    EmptyInput,

    /// Every candidate route was tried or pruned.
    #[error("No working route from {from} to {to} after {attempts} attempts")]
    NoRouteFound {
        from: String,
        to: String,
        attempts: usize,
    },

    /// The configured attempt limit was reached.
    #[error("Gave up after {attempts} failed routes")]
    AttemptsExhausted { attempts: usize },
}

impl ConvertError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::NoRouteFound { .. } => "no_route",
            Self::AttemptsExhausted { .. } => "attempts_exhausted",
        }
    }
}
