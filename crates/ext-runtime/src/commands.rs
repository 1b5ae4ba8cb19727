//! Global command registry.
//!
//! Commands are keyed by a flat string id with no enforced extension
//! namespacing. Each id holds a stack of registrations: the newest one
//! receives invocations, and removing it restores the one underneath. This
//! keeps behavior well defined when two extensions claim the same id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An invocable command implementation.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn invoke(&self, args: &[Value]) -> Result<Value>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    async fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }
}

/// Wrap a synchronous closure as a [`CommandHandler`].
///
/// Handlers that need to await should implement the trait directly.
pub fn command_fn<F>(handler: F) -> Arc<dyn CommandHandler>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(FnHandler(handler))
}

struct Registration {
    token: u64,
    owner: Option<String>,
    handler: Arc<dyn CommandHandler>,
}

/// Process-wide command table with per-id registration stacks.
pub struct CommandRegistry {
    entries: Mutex<HashMap<String, Vec<Registration>>>,
    next_token: AtomicU64,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Register a handler for `command_id` and return a removal token.
    ///
    /// Registering over an existing id logs a warning and shadows the
    /// previous handler until this registration is removed.
    pub fn register(
        &self,
        command_id: &str,
        owner: Option<&str>,
        handler: Arc<dyn CommandHandler>,
    ) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stack = entries.entry(command_id.to_string()).or_default();
        if !stack.is_empty() {
            tracing::warn!(
                command = %command_id,
                "command already registered; newest registration takes precedence"
            );
        }
        stack.push(Registration {
            token,
            owner: owner.map(str::to_string),
            handler,
        });
        token
    }

    /// Remove the registration identified by `token`.
    ///
    /// If a shadowed registration remains it becomes active again.
    pub fn remove(&self, command_id: &str, token: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(stack) = entries.get_mut(command_id) else {
            return false;
        };
        let Some(position) = stack.iter().position(|r| r.token == token) else {
            return false;
        };
        let was_top = position == stack.len() - 1;
        stack.remove(position);
        if stack.is_empty() {
            entries.remove(command_id);
        } else if was_top {
            tracing::debug!(command = %command_id, "earlier command registration restored");
        }
        true
    }

    /// Remove every registration owned by `owner` and return the affected
    /// command ids.
    pub fn remove_owner(&self, owner: &str) -> Vec<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut affected = Vec::new();
        entries.retain(|command_id, stack| {
            let before = stack.len();
            stack.retain(|r| r.owner.as_deref() != Some(owner));
            if stack.len() != before {
                affected.push(command_id.clone());
            }
            !stack.is_empty()
        });
        affected.sort();
        affected
    }

    /// Resolve the currently active handler for `command_id`.
    pub fn resolve(&self, command_id: &str) -> Option<Arc<dyn CommandHandler>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command_id)
            .and_then(|stack| stack.last())
            .map(|r| Arc::clone(&r.handler))
    }

    pub fn contains(&self, command_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(command_id)
    }

    /// All registered command ids, sorted.
    pub fn command_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
