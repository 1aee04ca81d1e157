//! Capability catalog: which formats each handler reads and writes.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::FileFormat;
use crate::handler::HandlerRegistry;

/// Formats supported by one handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub handler: String,
    pub formats: Vec<FileFormat>,
}

/// Ordered mapping from handler name to supported formats.
///
/// Order is significant and stable: the route graph derives handler rank from
/// it. The catalog is a cache in front of [`FormatHandler::init`]; entries are
/// only refreshed after an explicit [`invalidate`](Self::invalidate) or
/// [`clear`](Self::clear).
///
/// [`FormatHandler::init`]: crate::handler::FormatHandler::init
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityCatalog {
    entries: Vec<CatalogEntry>,
}

impl CapabilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the formats of `handler`.
    ///
    /// A replaced handler keeps its position; a new one is appended.
    pub fn insert(&mut self, handler: impl Into<String>, formats: Vec<FileFormat>) {
        let handler = handler.into();
        match self.entries.iter_mut().find(|e| e.handler == handler) {
            Some(entry) => entry.formats = formats,
            None => self.entries.push(CatalogEntry { handler, formats }),
        }
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, handler: impl Into<String>, formats: Vec<FileFormat>) -> Self {
        self.insert(handler, formats);
        self
    }

    pub fn contains(&self, handler: &str) -> bool {
        self.entries.iter().any(|e| e.handler == handler)
    }

    pub fn formats_of(&self, handler: &str) -> Option<&[FileFormat]> {
        self.entries
            .iter()
            .find(|e| e.handler == handler)
            .map(|e| e.formats.as_slice())
    }

    /// Finds the readable format of `handler` matching `format`'s MIME type
    /// and short identifier.
    pub fn find_input(&self, handler: &str, format: &FileFormat) -> Option<&FileFormat> {
        self.formats_of(handler)?
            .iter()
            .find(|f| f.from && f.same_representation(format))
    }

    /// Drops the cached formats of one handler.
    pub fn invalidate(&mut self, handler: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handler != handler);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of formats across all handlers.
    pub fn format_count(&self) -> usize {
        self.entries.iter().map(|e| e.formats.len()).sum()
    }

    /// Initializes every registered handler that has no cached entry and
    /// caches what it supports.
    ///
    /// Handlers that fail to initialize are skipped with a warning. After the
    /// call the catalog follows registry order; entries for handlers that
    /// are no longer registered are kept at the end.
    pub async fn populate(&mut self, registry: &HandlerRegistry) {
        let mut ordered = Vec::with_capacity(registry.len());

        for handler in registry.iter() {
            let name = handler.name();
            if let Some(pos) = self.entries.iter().position(|e| e.handler == name) {
                ordered.push(self.entries.remove(pos));
                continue;
            }

            warn!("Cache miss for formats of handler \"{}\"", name);
            if let Err(e) = handler.handler().init().await {
                warn!("Handler \"{}\" failed to initialize: {}", name, e);
                continue;
            }

            match handler.handler().supported_formats() {
                Some(formats) if !formats.is_empty() => {
                    info!(
                        "Updated supported format cache for \"{}\" ({} formats)",
                        name,
                        formats.len()
                    );
                    ordered.push(CatalogEntry {
                        handler: name.to_string(),
                        formats,
                    });
                }
                _ => warn!("Handler \"{}\" doesn't support any formats", name),
            }
        }

        ordered.append(&mut self.entries);
        self.entries = ordered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FormatHandler;
    use crate::testing::MockHandler;
    use std::sync::Arc;

    fn png() -> FileFormat {
        FileFormat::new("png", "image/png").with_lossless(true)
    }

    fn jpeg() -> FileFormat {
        FileFormat::new("jpeg", "image/jpeg")
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut catalog = CapabilityCatalog::new()
            .with("a", vec![png()])
            .with("b", vec![jpeg()]);
        catalog.insert("a", vec![png(), jpeg()]);

        let names: Vec<_> = catalog.entries().map(|e| e.handler.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(catalog.formats_of("a").unwrap().len(), 2);
        assert_eq!(catalog.format_count(), 3);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut catalog = CapabilityCatalog::new()
            .with("a", vec![png()])
            .with("b", vec![jpeg()]);

        assert!(catalog.invalidate("a"));
        assert!(!catalog.invalidate("a"));
        assert!(!catalog.contains("a"));
        assert_eq!(catalog.len(), 1);

        catalog.clear();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_find_input_requires_readable() {
        let catalog = CapabilityCatalog::new().with("a", vec![png().write_only(), jpeg()]);

        assert!(catalog.find_input("a", &png()).is_none());
        assert!(catalog.find_input("a", &jpeg()).is_some());
        assert!(catalog.find_input("missing", &jpeg()).is_none());
    }

    #[test]
    fn test_serializes_as_entry_list() {
        let catalog = CapabilityCatalog::new().with("a", vec![png()]);
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json[0]["handler"], "a");
        assert_eq!(json[0]["formats"][0]["mime"], "image/png");

        let back: CapabilityCatalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog);
    }

    #[tokio::test]
    async fn test_populate_skips_failing_and_empty_handlers() {
        let good = Arc::new(MockHandler::new("good").with_formats(vec![png(), jpeg()]));
        let broken = Arc::new(MockHandler::new("broken").with_formats(vec![png()]));
        broken.fail_init(true);
        let empty = Arc::new(MockHandler::new("empty"));

        let registry = HandlerRegistry::new()
            .with(broken.clone())
            .unwrap()
            .with(good.clone())
            .unwrap()
            .with(empty)
            .unwrap();

        let mut catalog = CapabilityCatalog::new();
        catalog.populate(&registry).await;

        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("good"));
        assert!(good.is_ready());
        assert_eq!(good.init_count(), 1);

        // Cached handlers are not initialized again
        catalog.populate(&registry).await;
        assert_eq!(good.init_count(), 1);
        assert_eq!(broken.init_count(), 2);
    }

    #[tokio::test]
    async fn test_populate_follows_registry_order() {
        let a = Arc::new(MockHandler::new("a").with_formats(vec![png()]));
        let b = Arc::new(MockHandler::new("b").with_formats(vec![jpeg()]));
        let registry = HandlerRegistry::new().with(a).unwrap().with(b).unwrap();

        let mut catalog = CapabilityCatalog::new()
            .with("b", vec![jpeg()])
            .with("stale", vec![png()]);
        catalog.populate(&registry).await;

        let names: Vec<_> = catalog.entries().map(|e| e.handler.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "stale"]);
    }
}
