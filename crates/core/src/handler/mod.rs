//! Format handlers: the conversion tools routes are made of.
//!
//! This module provides the `FormatHandler` trait, the ordered
//! `HandlerRegistry` and an FFmpeg-backed implementation.
//!
//! # Example
//!
//! ```ignore
//! use chainconv_core::handler::{FfmpegConfig, FfmpegHandler, FormatHandler, HandlerRegistry};
//!
//! let ffmpeg = Arc::new(FfmpegHandler::new(FfmpegConfig::default()));
//! let registry = HandlerRegistry::new().with(ffmpeg.clone())?;
//!
//! // Discover formats from `ffmpeg -formats`
//! ffmpeg.init().await?;
//! println!("{} formats", ffmpeg.supported_formats().unwrap_or_default().len());
//! ```

mod config;
mod error;
mod ffmpeg;
mod registry;
mod traits;

pub use config::FfmpegConfig;
pub use error::HandlerError;
pub use ffmpeg::FfmpegHandler;
pub use registry::HandlerRegistry;
pub use traits::{FormatHandler, HandlerRef};
