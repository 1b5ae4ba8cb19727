//! Typed event emitter handed to extension code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ext_runtime::Disposable;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A single-event emitter with listener registration via disposables.
///
/// Listeners are snapshotted at fire time: one added during delivery is not
/// invoked for that firing, and one disposed during delivery still is.
pub struct EventEmitter<T> {
    listeners: Arc<Mutex<Vec<(u64, Listener<T>)>>>,
    next_id: AtomicU64,
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener; disposing the returned handle unregisters it.
    pub fn event(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let listeners = Arc::clone(&self.listeners);
        Disposable::new(move || {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(listener_id, _)| *listener_id != id);
        })
    }

    /// Invoke every current listener with `payload`, in registration order.
    pub fn fire(&self, payload: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
