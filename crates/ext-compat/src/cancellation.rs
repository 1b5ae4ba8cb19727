//! Cancellation token shape.
//!
//! Exposed for interface completeness: extension code can pass tokens around
//! and observe cancellation, but no host operation currently requests it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ext_runtime::Disposable;

use crate::emitter::EventEmitter;

/// Observable cancellation flag.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    emitter: Arc<EventEmitter<()>>,
}

impl CancellationToken {
    /// A token that can never be cancelled.
    pub fn none() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            emitter: Arc::new(EventEmitter::new()),
        }
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Register a listener fired when cancellation is requested. On an
    /// already-cancelled token the listener fires immediately.
    pub fn on_cancellation_requested(
        &self,
        listener: impl Fn(&()) + Send + Sync + 'static,
    ) -> Disposable {
        if self.is_cancellation_requested() {
            listener(&());
            return Disposable::noop();
        }
        self.emitter.event(listener)
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancellation_requested())
            .finish()
    }
}

/// Owner side of a [`CancellationToken`].
pub struct CancellationTokenSource {
    token: CancellationToken,
}

impl CancellationTokenSource {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::none(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request cancellation; listeners fire on the first call only.
    pub fn cancel(&self) {
        let first = !self.token.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.token.emitter.fire(&());
        }
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}
