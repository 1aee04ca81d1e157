//! Types for the converter module.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::format::FileData;
use crate::graph::Route;

/// One failed route attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    /// Route as short format ids, e.g. `cur → ico → png`.
    pub route: String,
    /// Index of the step whose conversion failed (1 is the first hop).
    pub failed_step: usize,
    pub handler: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// Files in the goal format.
    pub files: Vec<FileData>,
    /// Route that produced the files. `None` when no conversion was needed.
    pub route: Option<Route>,
    /// Number of routes executed, including the successful one.
    pub attempts: usize,
    /// Routes that failed before the successful one.
    pub failures: Vec<AttemptReport>,
}

impl ConversionOutcome {
    /// Whether the inputs were returned unchanged.
    pub fn is_passthrough(&self) -> bool {
        self.route.is_none()
    }
}
