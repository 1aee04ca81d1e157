//! Conversion lifecycle integration tests.
//!
//! These tests run conversions end to end through the route converter:
//! search -> hop execution -> dead-end recording -> retry on the next route.

use std::sync::Arc;

use chainconv_core::{
    testing::{fixtures, MockHandler},
    ConversionOutcome, ConvertError, Direction, FileData, HandlerRegistry, PathStep,
    RouteConverter, RouteEngine, RoutingConfig, SearchMode, StepQuery,
};

/// Test helper holding the engine and direct handles to its mock handlers.
struct TestHarness {
    engine: RouteEngine,
    raster: Arc<MockHandler>,
    vector: Arc<MockHandler>,
    animator: Arc<MockHandler>,
}

impl TestHarness {
    async fn new(config: RoutingConfig) -> Self {
        let raster = Arc::new(MockHandler::new("raster").with_formats(vec![
            fixtures::png(),
            fixtures::jpeg(),
        ]));
        let vector = Arc::new(MockHandler::new("vector").with_formats(vec![
            fixtures::jpeg(),
            fixtures::png(),
            fixtures::gif(),
        ]));
        let animator = Arc::new(MockHandler::new("animator").with_formats(vec![
            fixtures::gif(),
            fixtures::mp4(),
        ]));

        let registry = HandlerRegistry::new()
            .with(raster.clone())
            .unwrap()
            .with(vector.clone())
            .unwrap()
            .with(animator.clone())
            .unwrap();
        let mut engine = RouteEngine::new(registry, config);
        engine.refresh().await.expect("graph builds");

        Self {
            engine,
            raster,
            vector,
            animator,
        }
    }

    fn step(&self, mime: &str, direction: Direction) -> PathStep {
        self.engine
            .resolve_step(&StepQuery::mime(mime), direction)
            .expect("format is in the catalog")
    }

    async fn convert(&self, from: &str, to: &str) -> Result<ConversionOutcome, ConvertError> {
        RouteConverter::new(&self.engine)
            .convert(
                vec![FileData::new("scan.jpeg", b"data".to_vec())],
                self.step(from, Direction::Input),
                self.step(to, Direction::Output),
                SearchMode::Simple,
            )
            .await
    }
}

#[tokio::test]
async fn test_three_hop_conversion() {
    let harness = TestHarness::new(RoutingConfig::default()).await;

    let outcome = harness.convert("image/jpeg", "video/mp4").await.unwrap();

    let route = outcome.route.expect("conversion ran");
    assert_eq!(route.format_chain(), "jpeg → gif → mp4");
    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].name, "scan.mp4");
    assert!(outcome.failures.is_empty());
    assert_eq!(harness.vector.conversion_count(), 1);
    assert_eq!(harness.animator.conversion_count(), 1);
}

#[tokio::test]
async fn test_failing_middle_hop_is_routed_around() {
    let harness = TestHarness::new(RoutingConfig::default()).await;
    harness.vector.fail_conversion("image/jpeg", "image/gif");

    let outcome = harness.convert("image/jpeg", "video/mp4").await.unwrap();

    let route = outcome.route.expect("conversion ran");
    assert_eq!(route.format_chain(), "jpeg → png → gif → mp4");
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].route, "jpeg → gif → mp4");
    assert_eq!(outcome.failures[0].handler, "vector");

    // The failed prefix stays registered until the next conversion
    assert_eq!(harness.engine.dead_ends().len(), 1);
    // The animator never saw the failed route
    let recorded = harness.animator.recorded_conversions();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].input_mime, "image/gif");
}

#[tokio::test]
async fn test_dead_ends_reset_between_conversions() {
    let harness = TestHarness::new(RoutingConfig::default()).await;
    harness.vector.fail_conversion("image/jpeg", "image/gif");
    harness.convert("image/jpeg", "video/mp4").await.unwrap();
    assert_eq!(harness.engine.dead_ends().len(), 1);

    let outcome = harness.convert("image/png", "image/jpeg").await.unwrap();
    assert_eq!(outcome.attempts, 1);
    assert!(harness.engine.dead_ends().is_empty());
}

#[tokio::test]
async fn test_every_route_failing() {
    let harness = TestHarness::new(RoutingConfig::default()).await;
    harness.animator.fail_conversion("image/gif", "video/mp4");

    let err = harness.convert("image/jpeg", "video/mp4").await.unwrap_err();

    match err {
        ConvertError::NoRouteFound { from, to, attempts } => {
            assert_eq!(from, "jpeg");
            assert_eq!(to, "mp4");
            // Routes reaching gif through another prefix are still tried
            assert!(attempts >= 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(harness.raster.conversion_count() >= 1);
    let recorded = harness.animator.recorded_conversions();
    assert!(!recorded.is_empty());
    assert!(recorded.iter().all(|c| !c.success));
}

#[tokio::test]
async fn test_attempt_limit_from_config() {
    let config = RoutingConfig {
        max_route_attempts: Some(1),
        ..Default::default()
    };
    let harness = TestHarness::new(config).await;
    harness.vector.fail_conversion("image/jpeg", "image/gif");

    let err = harness.convert("image/jpeg", "video/mp4").await.unwrap_err();
    assert!(matches!(err, ConvertError::AttemptsExhausted { attempts: 1 }));
}
