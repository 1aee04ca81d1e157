//! Ordered registry of format handlers.

use std::fmt;
use std::sync::Arc;

use super::error::HandlerError;
use super::traits::{FormatHandler, HandlerRef};

/// Handlers in priority order.
///
/// Registration order is significant: it is the handler rank the route graph
/// charges priority cost on, so earlier handlers are preferred.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<HandlerRef>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler after all previously registered ones.
    pub fn register(&mut self, handler: Arc<dyn FormatHandler>) -> Result<(), HandlerError> {
        if self.get(handler.name()).is_some() {
            return Err(HandlerError::DuplicateHandler {
                name: handler.name().to_string(),
            });
        }
        self.handlers.push(HandlerRef::new(handler));
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, handler: Arc<dyn FormatHandler>) -> Result<Self, HandlerError> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&HandlerRef> {
        self.handlers.iter().find(|h| h.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerRef> {
        self.handlers.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
