//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Route graph (builds, size)
//! - Route search (searches, yielded and filtered routes, iterations)
//! - Dead ends
//! - Conversions (route attempts, hop durations by handler)

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
};

// =============================================================================
// Route Graph Metrics
// =============================================================================

/// Route graph builds.
pub static GRAPH_BUILDS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("chainconv_graph_builds_total", "Total route graph builds").unwrap()
});

/// Size of the current route graph.
pub static GRAPH_SIZE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("chainconv_graph_size", "Size of the current route graph"),
        &["kind"], // "nodes", "edges"
    )
    .unwrap()
});

// =============================================================================
// Route Search Metrics
// =============================================================================

/// Route searches started.
pub static ROUTE_SEARCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("chainconv_route_searches_total", "Total route searches started").unwrap()
});

/// Routes yielded to consumers.
pub static ROUTES_YIELDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("chainconv_routes_yielded_total", "Total routes yielded by searches")
        .unwrap()
});

/// Candidate routes discarded before being yielded.
pub static ROUTES_FILTERED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chainconv_routes_filtered_total",
            "Candidate routes discarded during search",
        ),
        &["reason"], // "dead_end", "forbidden_chain", "goal_handler"
    )
    .unwrap()
});

/// Iterations per route search, observed when the search is dropped.
pub static SEARCH_ITERATIONS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "chainconv_search_iterations",
            "Frontier pops per route search",
        )
        .buckets(vec![1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0]),
    )
    .unwrap()
});

// =============================================================================
// Dead End Metrics
// =============================================================================

/// Dead-end prefixes recorded.
pub static DEAD_ENDS_RECORDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("chainconv_dead_ends_recorded_total", "Total dead-end prefixes recorded")
        .unwrap()
});

/// Dead-end prefixes currently registered.
pub static DEAD_ENDS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("chainconv_dead_ends_active", "Dead-end prefixes currently registered")
        .unwrap()
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversion requests by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainconv_conversions_total", "Total conversion requests"),
        &["result"], // "success", "passthrough", "no_route", "attempts_exhausted"
    )
    .unwrap()
});

/// Route attempts by result.
pub static ROUTE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainconv_route_attempts_total", "Total routes attempted"),
        &["result"], // "success", "failed", "skipped"
    )
    .unwrap()
});

/// Hop duration by handler.
pub static HOP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "chainconv_hop_duration_seconds",
            "Duration of a single handler conversion",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["handler"],
    )
    .unwrap()
});

/// Failed hops by handler and error kind.
pub static HOP_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainconv_hop_failures_total", "Total failed handler conversions"),
        &["handler", "kind"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Graph
        Box::new(GRAPH_BUILDS.clone()),
        Box::new(GRAPH_SIZE.clone()),
        // Search
        Box::new(ROUTE_SEARCHES.clone()),
        Box::new(ROUTES_YIELDED.clone()),
        Box::new(ROUTES_FILTERED.clone()),
        Box::new(SEARCH_ITERATIONS.clone()),
        // Dead ends
        Box::new(DEAD_ENDS_RECORDED.clone()),
        Box::new(DEAD_ENDS_ACTIVE.clone()),
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(ROUTE_ATTEMPTS.clone()),
        Box::new(HOP_DURATION.clone()),
        Box::new(HOP_FAILURES.clone()),
    ]
}
