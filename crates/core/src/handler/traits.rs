//! Trait definitions for the handler module.

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use super::error::HandlerError;
use crate::format::{FileData, FileFormat};

/// A conversion tool that can read and/or write a set of file formats.
#[async_trait]
pub trait FormatHandler: Send + Sync {
    /// Unique name of this handler. Also its key in the capability catalog.
    fn name(&self) -> &str;

    /// Whether `init` has completed successfully.
    fn is_ready(&self) -> bool;

    /// Loads the tool and discovers the formats it supports.
    async fn init(&self) -> Result<(), HandlerError>;

    /// Formats discovered by `init`. `None` until the handler is initialized.
    fn supported_formats(&self) -> Option<Vec<FileFormat>>;

    /// Converts `inputs` from `input` to `output`.
    ///
    /// Implementations may return more or fewer files than they received.
    async fn convert(
        &self,
        inputs: Vec<FileData>,
        input: &FileFormat,
        output: &FileFormat,
    ) -> Result<Vec<FileData>, HandlerError>;
}

/// Shared reference to a registered handler.
///
/// Two references are equal when they name the same handler, which is what
/// route steps and dead-end prefixes compare on.
#[derive(Clone)]
pub struct HandlerRef(Arc<dyn FormatHandler>);

impl HandlerRef {
    pub fn new(handler: Arc<dyn FormatHandler>) -> Self {
        Self(handler)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn handler(&self) -> &Arc<dyn FormatHandler> {
        &self.0
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.name() == other.name()
    }
}

impl Eq for HandlerRef {}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.name()).finish()
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for HandlerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<T: FormatHandler + 'static> From<Arc<T>> for HandlerRef {
    fn from(handler: Arc<T>) -> Self {
        Self(handler)
    }
}
