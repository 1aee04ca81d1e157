//! Types shared by the route graph, the search and the dead-end registry.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::format::FileFormat;
use crate::handler::HandlerRef;

/// One step of a route: the format reached and the handler that produced it.
///
/// The first step of a route is the start step; its handler is the one the
/// caller says the input came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub handler: Option<HandlerRef>,
    pub format: Arc<FileFormat>,
}

impl PathStep {
    pub fn new(handler: Option<HandlerRef>, format: impl Into<Arc<FileFormat>>) -> Self {
        Self {
            handler,
            format: format.into(),
        }
    }

    /// A step that names a format but no handler.
    pub fn origin(format: impl Into<Arc<FileFormat>>) -> Self {
        Self::new(None, format)
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.handler.as_ref().map(HandlerRef::name)
    }

    pub fn mime(&self) -> &str {
        &self.format.mime
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.handler_name().unwrap_or("-"),
            self.format.mime
        )
    }
}

impl Serialize for PathStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Step<'a> {
            handler: Option<&'a HandlerRef>,
            format: &'a FileFormat,
        }

        Step {
            handler: self.handler.as_ref(),
            format: &self.format,
        }
        .serialize(serializer)
    }
}

/// A complete candidate route from a start format to a goal format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub steps: Vec<PathStep>,
    pub cost: f64,
}

impl Route {
    /// Number of conversions along the route.
    pub fn hops(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Route as `image/png → image/x-icon`.
    pub fn mime_chain(&self) -> String {
        self.steps
            .iter()
            .map(PathStep::mime)
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// Route as `png → ico`, using short format ids.
    pub fn format_chain(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.format.format.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        f.write_str(&steps.join(" -> "))
    }
}

/// How strictly the goal step's handler is honored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Any handler may produce the goal format.
    #[default]
    Simple,
    /// The last hop must be performed by the goal step's handler, if it names one.
    Advanced,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Advanced => f.write_str("advanced"),
        }
    }
}
