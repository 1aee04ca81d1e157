//! File formats and the capability catalog.
//!
//! A [`FileFormat`] describes one file representation a handler can read
//! and/or write. The [`CapabilityCatalog`] caches, per handler and in handler
//! priority order, the formats each handler reported after initialization.

mod catalog;
mod types;

pub use catalog::{CapabilityCatalog, CatalogEntry};
pub use types::{FileData, FileFormat};
