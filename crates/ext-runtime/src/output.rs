//! Named output channels.

use std::sync::{Mutex, PoisonError};

/// An append-only text buffer extensions write diagnostics to.
///
/// Channels are created on first use and shared by name process-wide; the
/// rendering UI decides when and how to display them.
pub struct OutputChannel {
    name: String,
    buffer: Mutex<String>,
}

impl OutputChannel {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            buffer: Mutex::new(String::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn append(&self, text: &str) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    pub fn append_line(&self, text: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push_str(text);
        buffer.push('\n');
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Current buffer contents.
    pub fn content(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl std::fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputChannel")
            .field("name", &self.name)
            .field("len", &self.content().len())
            .finish()
    }
}
