//! Common test utilities for API testing with mock handlers.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock handlers registered, so routes can be searched and executed
//! without any real conversion tool.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use chainconv_core::{Config, HandlerRegistry, RouteEngine};
use chainconv_core::testing::MockHandler;

/// Re-export fixtures for test convenience
pub use chainconv_core::testing::fixtures;

/// Test fixture for API testing with mock handlers.
///
/// Registers two handlers, in this priority order:
/// - `images` reads and writes png, jpeg and gif
/// - `animator` reads and writes gif and mp4
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_preview() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/routes", json!({
///         "from": { "mime": "image/png" },
///         "to": { "mime": "video/mp4" }
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Image handler - configure failing conversions
    pub images: Arc<MockHandler>,
    /// Animation handler - the only one that writes mp4
    pub animator: Arc<MockHandler>,
    /// Temporary directory for input and output files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON endpoints
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default config.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a test fixture with custom configuration.
    ///
    /// The FFmpeg handler is never registered, whatever the config says.
    pub async fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.ffmpeg.enabled = false;

        let images = Arc::new(MockHandler::new("images").with_formats(vec![
            fixtures::png(),
            fixtures::jpeg(),
            fixtures::gif(),
        ]));
        let animator = Arc::new(
            MockHandler::new("animator").with_formats(vec![fixtures::gif(), fixtures::mp4()]),
        );

        let registry = HandlerRegistry::new()
            .with(images.clone())
            .expect("Failed to register images")
            .with(animator.clone())
            .expect("Failed to register animator");

        let mut engine = RouteEngine::new(registry, config.routing.clone());
        engine.refresh().await.expect("Failed to build graph");

        let state = Arc::new(chainconv_server::state::AppState::new(config, engine));
        let router = chainconv_server::api::create_router(state);

        Self {
            router,
            images,
            animator,
            temp_dir,
        }
    }

    /// Write an input file into the fixture's temp directory.
    pub fn write_input(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, bytes).expect("Failed to write input");
        path
    }

    /// Directory for conversion outputs, not created yet.
    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
