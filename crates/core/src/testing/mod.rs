//! Testing utilities and mock implementations.
//!
//! This module provides a mock format handler and format fixtures, allowing
//! route search and conversion tests without any real conversion tool.
//!
//! # Example
//!
//! ```rust,ignore
//! use chainconv_core::testing::{fixtures, MockHandler};
//!
//! let images = MockHandler::new("images")
//!     .with_formats(vec![fixtures::png(), fixtures::jpeg()]);
//! images.fail_conversion("image/png", "image/jpeg");
//!
//! // Register in a HandlerRegistry...
//! ```

mod mock_handler;

pub use mock_handler::{MockHandler, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::format::FileFormat;

    /// Create a format with an explicit category and losslessness.
    pub fn format(format: &str, mime: &str, category: &str, lossless: bool) -> FileFormat {
        FileFormat::new(format, mime)
            .with_category(category)
            .with_lossless(lossless)
    }

    /// Lossless PNG image.
    pub fn png() -> FileFormat {
        format("png", "image/png", "image", true).with_name("Portable Network Graphics")
    }

    /// Lossy JPEG image.
    pub fn jpeg() -> FileFormat {
        format("jpeg", "image/jpeg", "image", false)
            .with_name("Joint Photographic Experts Group JFIF")
    }

    /// Animated GIF, usable as image or video.
    pub fn gif() -> FileFormat {
        FileFormat::new("gif", "image/gif")
            .with_name("CompuServe Graphics Interchange Format")
            .with_category("image")
            .with_category("video")
            .with_lossless(false)
    }

    /// Lossy MP4 video.
    pub fn mp4() -> FileFormat {
        format("mp4", "video/mp4", "video", false).with_name("MPEG-4 Part 14")
    }

    /// Lossless WAV audio.
    pub fn wav() -> FileFormat {
        format("wav", "audio/wav", "audio", true).with_name("Waveform Audio File Format")
    }

    /// Lossy MP3 audio.
    pub fn mp3() -> FileFormat {
        format("mp3", "audio/mpeg", "audio", false).with_name("MP3 Audio")
    }

    /// Plain text.
    pub fn txt() -> FileFormat {
        format("txt", "text/plain", "text", true).with_name("Plain Text")
    }
}
