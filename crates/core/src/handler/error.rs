//! Error types for the handler module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while initializing or running a format handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler binary not found.
    #[error("Handler binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Handler is not ready for conversions.
    #[error("Handler \"{handler}\" not ready after init")]
    NotReady { handler: String },

    /// Handler initialization failed.
    #[error("Handler \"{handler}\" failed to initialize: {reason}")]
    InitFailed { handler: String, reason: String },

    /// A handler with the same name is already registered.
    #[error("Handler \"{name}\" is already registered")]
    DuplicateHandler { name: String },

    /// The handler does not support the requested format in that direction.
    #[error("Handler \"{handler}\" does not support {direction} format {format}")]
    UnsupportedFormat {
        handler: String,
        format: String,
        direction: &'static str,
    },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion produced at least one empty file.
    #[error("Output of handler \"{handler}\" is empty")]
    EmptyOutput { handler: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to parse handler tool output.
    #[error("Failed to parse handler output: {reason}")]
    ParseError { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new init failed error.
    pub fn init_failed(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InitFailed {
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported input format error.
    pub fn unsupported_input(handler: impl Into<String>, format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            handler: handler.into(),
            format: format.into(),
            direction: "input",
        }
    }

    /// Short machine-friendly label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BinaryNotFound { .. } => "binary_not_found",
            Self::NotReady { .. } => "not_ready",
            Self::InitFailed { .. } => "init_failed",
            Self::DuplicateHandler { .. } => "duplicate_handler",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::EmptyOutput { .. } => "empty_output",
            Self::Timeout { .. } => "timeout",
            Self::ParseError { .. } => "parse_error",
            Self::Io(_) => "io",
        }
    }
}
