//! Disposable handles returned by registration calls.

use std::sync::{Arc, Mutex, PoisonError};

type Cleanup = Box<dyn FnOnce() + Send>;

/// A handle that undoes a registration when disposed.
///
/// Disposables are cheaply cloneable; all clones share the same cleanup
/// closure and the first `dispose` call (on any clone) runs it. Subsequent
/// calls are no-ops.
#[derive(Clone)]
pub struct Disposable {
    cleanup: Arc<Mutex<Option<Cleanup>>>,
}

impl Disposable {
    /// Create a disposable that runs `cleanup` on first disposal.
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cleanup: Arc::new(Mutex::new(Some(Box::new(cleanup)))),
        }
    }

    /// Create a disposable with no cleanup action.
    pub fn noop() -> Self {
        Self {
            cleanup: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the cleanup action if it has not run yet.
    pub fn dispose(&self) {
        let cleanup = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    /// Whether the cleanup action has already run (or never existed).
    pub fn is_disposed(&self) -> bool {
        self.cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
