//! Types for file formats and file payloads.

use serde::{Deserialize, Deserializer, Serialize};

/// A file format a handler can read and/or write.
///
/// Formats are owned by the handler that declared them. The route graph only
/// keeps shared references and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFormat {
    /// Human readable name (e.g. "Portable Network Graphics").
    pub name: String,
    /// Short format identifier (e.g. "png").
    pub format: String,
    /// Preferred file extension, without the dot.
    pub extension: String,
    /// MIME type. Unique key of a node in the route graph.
    pub mime: String,
    /// Whether the handler can read this format.
    #[serde(default)]
    pub from: bool,
    /// Whether the handler can write this format.
    #[serde(default)]
    pub to: bool,
    /// Handler-internal identifier (codec, muxer, ...).
    #[serde(default)]
    pub internal: String,
    /// Semantic categories ("image", "audio", "video", "text", ...).
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    /// Whether writing this format preserves all information.
    #[serde(default)]
    pub lossless: bool,
}

impl FileFormat {
    /// Creates a readable and writable lossy format with no explicit category.
    ///
    /// `name`, `extension` and `internal` default to values derived from
    /// the short identifier.
    pub fn new(format: impl Into<String>, mime: impl Into<String>) -> Self {
        let format = format.into();
        Self {
            name: format.to_uppercase(),
            extension: format.clone(),
            internal: format.clone(),
            format,
            mime: mime.into(),
            from: true,
            to: true,
            category: Vec::new(),
            lossless: false,
        }
    }

    /// Sets the human readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the handler-internal identifier.
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal = internal.into();
        self
    }

    /// Adds a category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category.push(category.into());
        self
    }

    /// Sets the losslessness flag.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    /// Marks the format as input only.
    pub fn read_only(mut self) -> Self {
        self.from = true;
        self.to = false;
        self
    }

    /// Marks the format as output only.
    pub fn write_only(mut self) -> Self {
        self.from = false;
        self.to = true;
        self
    }

    /// Effective categories of this format.
    ///
    /// Explicit categories win. Otherwise the top-level MIME type is used
    /// (`image/png` -> `image`); a MIME type without a top-level part yields
    /// no category at all.
    pub fn categories(&self) -> Vec<&str> {
        if !self.category.is_empty() {
            return self.category.iter().map(String::as_str).collect();
        }
        match self.mime.split('/').next() {
            Some(top) if !top.is_empty() => vec![top],
            _ => Vec::new(),
        }
    }

    /// Whether one of the effective categories equals `category`.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }

    /// Whether two formats describe the same file representation.
    ///
    /// Handlers may declare the same MIME type under different short ids
    /// (e.g. "mp4" and "mov"), so both must match.
    pub fn same_representation(&self, other: &FileFormat) -> bool {
        self.mime == other.mime && self.format == other.format
    }
}

/// Accepts either `"image"` or `["image", "video"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// An in-memory file handed to and returned by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// File name, including extension.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileData {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the file name with its extension replaced.
    pub fn renamed_for(&self, extension: &str) -> String {
        let stem = match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => self.name.as_str(),
        };
        format!("{}.{}", stem, extension)
    }
}
