//! FFmpeg-based format handler.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::FfmpegConfig;
use super::error::HandlerError;
use super::traits::FormatHandler;
use crate::format::{FileData, FileFormat};

/// One row of `ffmpeg -formats`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatListing {
    demux: bool,
    mux: bool,
    names: Vec<String>,
    description: String,
}

/// Handler that discovers its formats from `ffmpeg -formats` and converts by
/// running the ffmpeg binary in a scratch directory.
pub struct FfmpegHandler {
    config: FfmpegConfig,
    ready: AtomicBool,
    formats: RwLock<Option<Vec<FileFormat>>>,
}

impl FfmpegHandler {
    /// Creates a new FFmpeg handler with the given configuration.
    pub fn new(config: FfmpegConfig) -> Self {
        Self {
            config,
            ready: AtomicBool::new(false),
            formats: RwLock::new(None),
        }
    }

    /// Creates a handler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FfmpegConfig::default())
    }

    /// Parses the table printed by `ffmpeg -formats`.
    ///
    /// Rows start after the dashed separator line. Each row is
    /// `<flags> <name[,name...]> <description>`.
    fn parse_format_list(stdout: &str) -> Vec<FormatListing> {
        let mut lines = stdout.lines();
        // Skip the legend
        for line in lines.by_ref() {
            if line.trim_start().starts_with("--") {
                break;
            }
        }

        let mut listings = Vec::new();
        for line in lines {
            let mut parts = line.split_whitespace();
            let (Some(flags), Some(names)) = (parts.next(), parts.next()) else {
                continue;
            };
            let description = parts.collect::<Vec<_>>().join(" ");
            listings.push(FormatListing {
                demux: flags.contains('D'),
                mux: flags.contains('E'),
                names: names.split(',').map(str::to_string).collect(),
                description,
            });
        }
        listings
    }

    /// Extracts `(extension, mime)` from `ffmpeg -h muxer=<name>` output.
    fn parse_muxer_details(stdout: &str) -> Option<(String, String)> {
        let extension_re = Regex::new(r"(?m)^\s*Common extensions:\s*([^,.\s]+)").ok()?;
        let mime_re = Regex::new(r"(?m)^\s*Mime type:\s*(\S+?)[.,]?\s*$").ok()?;

        let extension = extension_re.captures(stdout)?.get(1)?.as_str().to_string();
        let mime = mime_re.captures(stdout)?.get(1)?.as_str().to_string();
        Some((extension, mime))
    }

    /// Picks the size ffmpeg suggests when an encoder rejects the input size.
    fn parse_valid_size(stderr: &str) -> Option<String> {
        let rest = stderr.split("Valid sizes are ").nth(1)?;
        let sizes = rest.split('.').next()?;
        sizes
            .split_whitespace()
            .last()
            .map(|s| s.trim_end_matches(',').to_string())
    }

    /// Builds ffmpeg arguments for a conversion inside the scratch directory.
    fn build_args(
        &self,
        input: &FileFormat,
        output: &FileFormat,
        output_name: &str,
        extra: &[String],
    ) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            "list.txt".to_string(),
            "-f".to_string(),
            output.internal.clone(),
        ];

        // Still images are fed as a one frame per second slideshow
        if input.format == "png" || input.mime == "image/jpeg" {
            args.extend(["-r".to_string(), "1".to_string()]);
        }

        args.extend(extra.iter().cloned());
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_name.to_string());
        args
    }

    /// Runs ffmpeg with `args` and returns its stdout, bounded by `timeout_secs`.
    async fn run(
        &self,
        args: &[String],
        dir: Option<&Path>,
        timeout_secs: u64,
    ) -> Result<std::process::Output, HandlerError> {
        let mut command = Command::new(&self.config.ffmpeg_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HandlerError::BinaryNotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            } else {
                HandlerError::Io(e)
            }
        })?;

        match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(HandlerError::Timeout { timeout_secs }),
        }
    }

    /// Discovers extension and MIME type of a muxer, falling back to guesses.
    async fn muxer_details(&self, name: &str) -> (String, String) {
        // The png muxer has no MIME type, apng does
        let lookup = if name == "png" { "apng" } else { name };
        let args = vec![
            "-hide_banner".to_string(),
            "-h".to_string(),
            format!("muxer={}", lookup),
        ];

        let details = match self.run(&args, None, self.config.probe_timeout_secs).await {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                Self::parse_muxer_details(&stdout)
            }
            Err(e) => {
                debug!("Muxer lookup for {} failed: {}", lookup, e);
                None
            }
        };

        details.unwrap_or_else(|| (name.to_string(), Self::guess_mime(name)))
    }

    /// MIME type registered for `name` as a file extension, else `video/<name>`.
    fn guess_mime(name: &str) -> String {
        mime_guess::from_ext(name)
            .first_raw()
            .map(str::to_string)
            .unwrap_or_else(|| format!("video/{}", name))
    }

    async fn discover_formats(&self) -> Result<Vec<FileFormat>, HandlerError> {
        let args = vec!["-formats".to_string(), "-hide_banner".to_string()];
        let output = self.run(&args, None, self.config.probe_timeout_secs).await?;
        if !output.status.success() {
            return Err(HandlerError::init_failed(
                self.name(),
                format!("ffmpeg -formats exited with code {:?}", output.status.code()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let listings = Self::parse_format_list(&stdout);
        if listings.is_empty() {
            return Err(HandlerError::ParseError {
                reason: "ffmpeg -formats listed no formats".to_string(),
            });
        }

        let mut formats = Vec::new();
        for listing in listings {
            let Some(primary) = listing.names.first() else {
                continue;
            };
            let (extension, mime) = self.muxer_details(primary).await;
            let aliased = listing.names.len() > 1;

            for name in &listing.names {
                let display_name = if aliased {
                    format!("{} / {}", listing.description, name)
                } else {
                    listing.description.clone()
                };
                formats.push(FileFormat {
                    name: display_name,
                    format: name.clone(),
                    extension: extension.clone(),
                    mime: mime.clone(),
                    from: listing.demux,
                    to: listing.mux,
                    internal: name.clone(),
                    category: Vec::new(),
                    lossless: false,
                });
            }
        }

        let priority = |format: &FileFormat| {
            self.config
                .prioritized_formats
                .iter()
                .position(|p| *p == format.format)
                .unwrap_or(usize::MAX)
        };
        formats.sort_by_key(priority);

        Ok(formats)
    }

    /// Runs one conversion attempt in `dir`.
    async fn run_conversion(
        &self,
        dir: &Path,
        inputs: &[FileData],
        input: &FileFormat,
        output: &FileFormat,
    ) -> Result<Vec<u8>, HandlerError> {
        let mut list = String::new();
        for (i, file) in inputs.iter().enumerate() {
            let name = format!("input{}.{}", i, input.extension);
            tokio::fs::write(dir.join(&name), &file.bytes).await?;
            list.push_str(&format!("file '{}'\n", name));
        }
        tokio::fs::write(dir.join("list.txt"), list).await?;

        let output_name = "output";
        let mut extra: Vec<String> = Vec::new();
        let mut retried = false;

        loop {
            let args = self.build_args(input, output, output_name, &extra);
            let result = self.run(&args, Some(dir), self.config.timeout_secs).await?;

            if result.status.success() {
                break;
            }

            let stderr = String::from_utf8_lossy(&result.stderr).to_string();
            if !retried {
                if let Some(size) = Self::parse_valid_size(&stderr) {
                    debug!("Retrying {} with size {}", output.format, size);
                    extra = vec!["-s".to_string(), size];
                    retried = true;
                    continue;
                }
            }

            return Err(HandlerError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", result.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        tokio::fs::read(dir.join(output_name))
            .await
            .map_err(|_| HandlerError::conversion_failed("Output file not created", None))
    }

    fn scratch_dir(&self) -> PathBuf {
        self.config.temp_dir.join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl FormatHandler for FfmpegHandler {
    fn name(&self) -> &str {
        "FFmpeg"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn init(&self) -> Result<(), HandlerError> {
        let start = Instant::now();
        let formats = self.discover_formats().await?;
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        info!(
            "FFmpeg handler discovered {} formats in {} ms",
            formats.len(),
            start.elapsed().as_millis()
        );

        match self.formats.write() {
            Ok(mut guard) => *guard = Some(formats),
            Err(poisoned) => *poisoned.into_inner() = Some(formats),
        }
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn supported_formats(&self) -> Option<Vec<FileFormat>> {
        match self.formats.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn convert(
        &self,
        inputs: Vec<FileData>,
        input: &FileFormat,
        output: &FileFormat,
    ) -> Result<Vec<FileData>, HandlerError> {
        if !self.is_ready() {
            return Err(HandlerError::NotReady {
                handler: self.name().to_string(),
            });
        }
        let Some(first) = inputs.first() else {
            return Ok(Vec::new());
        };
        let base_name = first.name.split('.').next().unwrap_or("output").to_string();

        let dir = self.scratch_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let result = self.run_conversion(&dir, &inputs, input, output).await;

        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!("Failed to clean up {}: {}", dir.display(), e);
        }

        let bytes = result?;
        Ok(vec![FileData::new(
            format!("{}.{}", base_name, output.extension),
            bytes,
        )])
    }
}
