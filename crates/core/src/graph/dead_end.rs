//! Registry of route prefixes known to fail.

use prometheus::IntGauge;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::types::PathStep;
use crate::metrics;

/// Shared list of failed route prefixes.
///
/// Clones share the same list. Searches consult it on every dequeue, so a
/// prefix recorded while a search is suspended prunes that search's
/// remaining candidates too.
#[derive(Clone, Default)]
pub struct DeadEndRegistry {
    prefixes: Arc<RwLock<Vec<Vec<PathStep>>>>,
    /// Reports the number of registered prefixes, if set.
    active: Option<IntGauge>,
}

impl DeadEndRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose size is reported through `gauge`.
    pub fn with_gauge(gauge: IntGauge) -> Self {
        gauge.set(0);
        Self {
            prefixes: Arc::default(),
            active: Some(gauge),
        }
    }

    /// Registers `prefix` as a dead end. Empty prefixes are ignored.
    pub fn record(&self, prefix: Vec<PathStep>) {
        if prefix.is_empty() {
            warn!("Ignoring empty dead-end prefix");
            return;
        }

        let mut prefixes = self.write();
        if prefixes.contains(&prefix) {
            return;
        }
        debug!(
            "Recorded dead end: {}",
            prefix
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        prefixes.push(prefix);
        metrics::DEAD_ENDS_RECORDED.inc();
        self.report(prefixes.len());
    }

    /// Drops every registered prefix.
    pub fn clear(&self) {
        let mut prefixes = self.write();
        prefixes.clear();
        self.report(0);
    }

    /// Whether `path` starts with a registered prefix.
    pub fn is_dead_end(&self, path: &[PathStep]) -> bool {
        self.matching_prefix_len(path).is_some()
    }

    /// Length of the first registered prefix `path` starts with.
    pub fn matching_prefix_len(&self, path: &[PathStep]) -> Option<usize> {
        self.read()
            .iter()
            .find(|prefix| path.starts_with(prefix))
            .map(Vec::len)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn report(&self, len: usize) {
        if let Some(gauge) = &self.active {
            gauge.set(len as i64);
        }
    }

    // Prefix lists stay consistent even if a writer panicked.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Vec<PathStep>>> {
        self.prefixes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Vec<PathStep>>> {
        self.prefixes.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for DeadEndRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadEndRegistry")
            .field("prefixes", &self.len())
            .field("reported", &self.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerRef;
    use crate::testing::fixtures::{gif, jpeg, png};
    use crate::testing::MockHandler;

    fn step(handler: &str, format: crate::format::FileFormat) -> PathStep {
        PathStep::new(
            Some(HandlerRef::from(std::sync::Arc::new(MockHandler::new(handler)))),
            format,
        )
    }

    #[test]
    fn test_prefix_matching() {
        let registry = DeadEndRegistry::new();
        let prefix = vec![PathStep::origin(png()), step("a", jpeg())];
        registry.record(prefix.clone());

        let longer = vec![PathStep::origin(png()), step("a", jpeg()), step("b", gif())];
        assert!(registry.is_dead_end(&prefix));
        assert!(registry.is_dead_end(&longer));
        assert_eq!(registry.matching_prefix_len(&longer), Some(2));

        // Shorter than the prefix
        assert!(!registry.is_dead_end(&prefix[..1]));
        // Same formats through another handler
        let other = vec![PathStep::origin(png()), step("b", jpeg())];
        assert!(!registry.is_dead_end(&other));
    }

    #[test]
    fn test_only_gauged_registry_reports_size() {
        let gauge = IntGauge::new("test_dead_ends_active", "test").unwrap();
        let reported = DeadEndRegistry::with_gauge(gauge.clone());
        let silent = DeadEndRegistry::new();

        reported.record(vec![PathStep::origin(png()), step("a", jpeg())]);
        reported.record(vec![PathStep::origin(png()), step("b", gif())]);
        assert_eq!(gauge.get(), 2);

        // Another registry leaves the gauge alone
        silent.record(vec![PathStep::origin(png()), step("a", gif())]);
        silent.clear();
        assert_eq!(gauge.get(), 2);

        // Clones share the gauge
        reported.clone().clear();
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let registry = DeadEndRegistry::new();
        let prefix = vec![PathStep::origin(png()), step("a", jpeg())];
        registry.record(prefix.clone());
        assert_eq!(registry.len(), 1);

        registry.clear();
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.is_dead_end(&prefix));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = DeadEndRegistry::new();
        let handle = registry.clone();
        handle.record(vec![PathStep::origin(png()), step("a", jpeg())]);
        handle.record(vec![PathStep::origin(png()), step("a", jpeg())]);

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_prefix_ignored() {
        let registry = DeadEndRegistry::new();
        registry.record(Vec::new());
        assert!(registry.is_empty());
        assert!(!registry.is_dead_end(&[PathStep::origin(png())]));
    }
}
