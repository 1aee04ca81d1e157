//! Conversion-route engine.
//!
//! Builds a weighted graph over file formats from the capabilities of a set
//! of conversion handlers, enumerates candidate conversion routes cheapest
//! first, and executes them while learning which route prefixes fail.

pub mod config;
pub mod converter;
pub mod engine;
pub mod format;
pub mod graph;
pub mod handler;
pub mod metrics;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig, ServerConfig,
};
pub use converter::{AttemptReport, ConversionOutcome, ConvertError, RouteConverter};
pub use engine::{Direction, RouteEngine, StepQuery};
pub use format::{CapabilityCatalog, CatalogEntry, FileData, FileFormat};
pub use graph::{
    CostModel, DeadEndRegistry, GraphError, PathStep, Route, RouteGraph, RouteSearch,
    RoutingConfig, SearchMode,
};
pub use handler::{
    FfmpegConfig, FfmpegHandler, FormatHandler, HandlerError, HandlerRef, HandlerRegistry,
};
