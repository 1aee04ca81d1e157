//! Route execution.
//!
//! This module provides the `RouteConverter`, which pulls candidate routes
//! from the route engine cheapest first and runs each hop through its
//! handler until one route produces output.
//!
//! # Example
//!
//! ```ignore
//! use chainconv_core::converter::RouteConverter;
//! use chainconv_core::graph::{PathStep, SearchMode};
//!
//! let outcome = RouteConverter::new(&engine)
//!     .convert(files, PathStep::origin(cur), PathStep::origin(webp), SearchMode::Simple)
//!     .await?;
//!
//! if let Some(route) = &outcome.route {
//!     println!("Converted via {} after {} attempts", route.format_chain(), outcome.attempts);
//! }
//! ```

mod error;
mod route_converter;
mod types;

pub use error::ConvertError;
pub use route_converter::RouteConverter;
pub use types::{AttemptReport, ConversionOutcome};
