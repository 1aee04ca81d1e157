//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; route search, dead-end and conversion
//! metrics come from `chainconv_core::metrics` and are registered into the
//! same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "chainconv_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainconv_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "chainconv_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics (collected dynamically)
// =============================================================================

/// Handlers with cached capabilities, by readiness.
pub static CATALOG_HANDLERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "chainconv_catalog_handlers",
            "Number of handlers in the capability catalog",
        ),
        &["state"],
    )
    .unwrap()
});

/// Formats across all cached handlers.
pub static CATALOG_FORMATS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "chainconv_catalog_formats",
        "Number of formats in the capability catalog",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_HANDLERS.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_FORMATS.clone()))
        .unwrap();

    // Core metrics (graph, search, dead ends, conversions)
    for metric in chainconv_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so catalog gauges reflect the engine as it is now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let engine = state.engine().read().await;
    let catalog = engine.catalog();

    let ready = catalog
        .entries()
        .filter(|e| {
            engine
                .registry()
                .get(&e.handler)
                .is_some_and(|h| h.handler().is_ready())
        })
        .count();

    CATALOG_HANDLERS
        .with_label_values(&["ready"])
        .set(ready as i64);
    CATALOG_HANDLERS
        .with_label_values(&["cached"])
        .set((catalog.len() - ready) as i64);
    CATALOG_FORMATS.set(catalog.format_count() as i64);
}
