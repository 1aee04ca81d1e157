//! Conversion API handlers.

use axum::{extract::State, http::StatusCode, Json};
use chainconv_core::{AttemptReport, FileData, RouteConverter, SearchMode, StepQuery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ApiError;
use super::search::{resolve_endpoints, RouteView};
use crate::state::AppState;

/// Request body for a conversion
#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    /// Files to convert, all in the `from` format.
    pub inputs: Vec<PathBuf>,
    /// Directory the converted files are written to. Created if missing.
    pub output_dir: PathBuf,
    pub from: StepQuery,
    pub to: StepQuery,
    pub mode: Option<SearchMode>,
}

/// Response for a conversion
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub outputs: Vec<PathBuf>,
    /// `None` when input and output formats were identical.
    pub route: Option<RouteView>,
    pub attempts: usize,
    pub failures: Vec<AttemptReport>,
}

/// POST /api/v1/convert
///
/// Convert local files, trying routes in order of cost until one works.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConvertBody>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if body.inputs.is_empty() {
        return Err(ApiError::bad_request("No input files"));
    }

    let files = read_inputs(&body.inputs, state.config().server.max_input_bytes).await?;

    // Conversions share the engine's dead-end registry, so they run one at a time
    let engine = state.engine().write().await;
    let mode = body.mode.unwrap_or(engine.config().default_mode);
    let (from, to) = resolve_endpoints(&engine, &body.from, &body.to)?;

    info!(
        "Converting {} files from {} to {} ({} mode)",
        files.len(),
        from,
        to,
        mode
    );

    let outcome = RouteConverter::new(&engine)
        .convert(files, from, to, mode)
        .await?;
    drop(engine);

    let outputs = write_outputs(&body.output_dir, &outcome.files).await?;

    Ok(Json(ConvertResponse {
        outputs,
        route: outcome.route.map(RouteView::from),
        attempts: outcome.attempts,
        failures: outcome.failures,
    }))
}

async fn read_inputs(paths: &[PathBuf], max_bytes: u64) -> Result<Vec<FileData>, ApiError> {
    let mut total: u64 = 0;
    for path in paths {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ApiError::bad_request(format!("Cannot read {:?}: {}", path, e)))?;
        if !metadata.is_file() {
            return Err(ApiError::bad_request(format!("{:?} is not a file", path)));
        }
        total = total.saturating_add(metadata.len());
    }

    if total > max_bytes {
        return Err(ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Inputs total {} bytes, limit is {}", total, max_bytes),
        ));
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::bad_request(format!("Cannot read {:?}: {}", path, e)))?;
        files.push(FileData::new(file_name(path), bytes));
    }
    Ok(files)
}

async fn write_outputs(dir: &Path, files: &[FileData]) -> Result<Vec<PathBuf>, ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::internal(format!("Cannot create {:?}: {}", dir, e)))?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        // Handlers name their outputs; only the final component is trusted
        let name = file_name(Path::new(&file.name));
        let path = dir.join(&name);
        tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
            warn!("Failed to write {:?}: {}", path, e);
            ApiError::internal(format!("Cannot write {:?}: {}", path, e))
        })?;
        written.push(path);
    }
    Ok(written)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
