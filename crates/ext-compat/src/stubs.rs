//! No-op namespaces for API groups the host does not implement.
//!
//! Extension code frequently touches `languages`, `debug`, `tasks` and
//! friends during activation even when its feature set never exercises
//! them. These stubs accept the calls, log them, and hand back inert
//! disposables so that code keeps running.

use serde_json::Value;

use ext_runtime::Disposable;

/// A callable-but-inert capability group.
pub struct StubNamespace {
    name: &'static str,
}

impl StubNamespace {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Accept a registration-shaped call and return an inert disposable.
    pub fn register(&self, registration: &str) -> Disposable {
        tracing::debug!(
            namespace = self.name,
            registration = %registration,
            "registration on stub namespace ignored"
        );
        Disposable::noop()
    }

    /// Accept a lookup-shaped call; there is never a value to return.
    pub fn get(&self, item: &str) -> Option<Value> {
        tracing::debug!(
            namespace = self.name,
            item = %item,
            "lookup on stub namespace returns nothing"
        );
        None
    }
}
