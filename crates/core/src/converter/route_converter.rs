//! Executes candidate routes until one of them works.

use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

use super::error::ConvertError;
use super::types::{AttemptReport, ConversionOutcome};
use crate::engine::RouteEngine;
use crate::format::FileData;
use crate::graph::{PathStep, Route, SearchMode};
use crate::handler::HandlerError;
use crate::metrics;

/// A failed hop inside a route.
#[derive(Debug)]
struct HopFailure {
    /// Index of the step that could not be produced.
    step: usize,
    handler: String,
    error: HandlerError,
}

/// Drives route search and route execution for one engine.
///
/// Each call to [`convert`](Self::convert) starts from an empty dead-end
/// registry. A failing hop registers the route prefix up to and including
/// that hop, which prunes every later candidate sharing it, including the
/// ones already queued by the running search.
pub struct RouteConverter<'e> {
    engine: &'e RouteEngine,
    max_attempts: Option<usize>,
}

impl<'e> RouteConverter<'e> {
    pub fn new(engine: &'e RouteEngine) -> Self {
        Self {
            engine,
            max_attempts: engine.config().max_route_attempts,
        }
    }

    /// Overrides the configured attempt limit.
    pub fn with_max_attempts(mut self, max_attempts: Option<usize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Converts `files` from the `from` step's format to the `to` step's format.
    pub async fn convert(
        &self,
        files: Vec<FileData>,
        from: PathStep,
        to: PathStep,
        mode: SearchMode,
    ) -> Result<ConversionOutcome, ConvertError> {
        if files.is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        if from.format.same_representation(&to.format) {
            info!(
                "Input and output are both {}, nothing to convert",
                to.format.format
            );
            metrics::CONVERSIONS_TOTAL
                .with_label_values(&["passthrough"])
                .inc();
            return Ok(ConversionOutcome {
                files,
                route: None,
                attempts: 0,
                failures: Vec::new(),
            });
        }

        self.engine.clear_dead_ends();
        let dead_ends = self.engine.dead_ends();
        let mut attempts = 0;
        let mut failures = Vec::new();

        for mut route in self.engine.search(from.clone(), to.clone(), mode) {
            // Use the exact output format if the goal handler produces it
            let ends_with_goal_handler = to.handler.is_some()
                && route.hops() > 0
                && route.last().and_then(|s| s.handler.as_ref()) == to.handler.as_ref();
            if ends_with_goal_handler {
                if let Some(last) = route.steps.last_mut() {
                    *last = to.clone();
                }
            }

            if let Some(len) = dead_ends.matching_prefix_len(&route.steps) {
                warn!(
                    "Skipping {} due to dead end near {}",
                    route.format_chain(),
                    format_tail(&route.steps[..len])
                );
                metrics::ROUTE_ATTEMPTS.with_label_values(&["skipped"]).inc();
                continue;
            }

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    warn!("Giving up after {} failed routes", attempts);
                    metrics::CONVERSIONS_TOTAL
                        .with_label_values(&["attempts_exhausted"])
                        .inc();
                    return Err(ConvertError::AttemptsExhausted { attempts });
                }
            }

            attempts += 1;
            info!("Trying {} (cost {:.2})", route.format_chain(), route.cost);

            match self.execute(&files, &route).await {
                Ok(output) => {
                    info!(
                        "Converted {} files via {} after {} attempts",
                        output.len(),
                        route.format_chain(),
                        attempts
                    );
                    metrics::ROUTE_ATTEMPTS.with_label_values(&["success"]).inc();
                    metrics::CONVERSIONS_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                    return Ok(ConversionOutcome {
                        files: output,
                        route: Some(route),
                        attempts,
                        failures,
                    });
                }
                Err(failure) => {
                    metrics::ROUTE_ATTEMPTS.with_label_values(&["failed"]).inc();
                    self.engine
                        .record_dead_end(route.steps[..=failure.step].to_vec());
                    failures.push(AttemptReport {
                        route: route.format_chain(),
                        failed_step: failure.step,
                        handler: failure.handler,
                        error: failure.error.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        }

        metrics::CONVERSIONS_TOTAL
            .with_label_values(&["no_route"])
            .inc();
        Err(ConvertError::NoRouteFound {
            from: from.format.format.clone(),
            to: to.format.format.clone(),
            attempts,
        })
    }

    async fn execute(&self, files: &[FileData], route: &Route) -> Result<Vec<FileData>, HopFailure> {
        let mut current = files.to_vec();

        for (i, pair) in route.steps.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let handler = next.handler_name().unwrap_or("-").to_string();

            match self.hop(current, prev, next).await {
                Ok(output) => current = output,
                Err(error) => {
                    warn!(
                        "{} {} → {} failed: {}",
                        handler, prev.format.format, next.format.format, error
                    );
                    metrics::HOP_FAILURES
                        .with_label_values(&[handler.as_str(), error.kind()])
                        .inc();
                    return Err(HopFailure {
                        step: i + 1,
                        handler,
                        error,
                    });
                }
            }
        }

        Ok(current)
    }

    async fn hop(
        &self,
        files: Vec<FileData>,
        prev: &PathStep,
        next: &PathStep,
    ) -> Result<Vec<FileData>, HandlerError> {
        let Some(handler_ref) = &next.handler else {
            return Err(HandlerError::conversion_failed(
                format!("no handler produces {}", next.format.mime),
                None,
            ));
        };
        let name = handler_ref.name();
        let handler = handler_ref.handler();

        if !handler.is_ready() {
            handler.init().await?;
            if !handler.is_ready() {
                return Err(HandlerError::NotReady {
                    handler: name.to_string(),
                });
            }
        }

        let input = self
            .engine
            .catalog()
            .find_input(name, &prev.format)
            .cloned()
            .or_else(|| {
                handler.supported_formats().and_then(|formats| {
                    formats
                        .into_iter()
                        .find(|f| f.from && f.same_representation(&prev.format))
                })
            })
            .ok_or_else(|| HandlerError::unsupported_input(name, &prev.format.format))?;

        let start = Instant::now();
        let output = handler.convert(files, &input, &next.format).await;
        metrics::HOP_DURATION
            .with_label_values(&[name])
            .observe(start.elapsed().as_secs_f64());

        let output = output?;
        if output.is_empty() || output.iter().any(FileData::is_empty) {
            return Err(HandlerError::EmptyOutput {
                handler: name.to_string(),
            });
        }
        Ok(output)
    }
}

/// The last two formats of a prefix, e.g. `png → jpeg`.
fn format_tail(steps: &[PathStep]) -> String {
    let skip = steps.len().saturating_sub(2);
    steps[skip..]
        .iter()
        .map(|s| s.format.format.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}
