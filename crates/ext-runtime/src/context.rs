//! Per-activation extension context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::disposable::Disposable;
use crate::error::{Error, Result};

/// In-memory key-value store scoped to one extension activation.
///
/// Mirrors the memento shape extension code expects: `update` with a value
/// stores it, `update` with `None` removes the key.
#[derive(Debug, Default)]
pub struct Memento {
    values: Mutex<HashMap<String, Value>>,
}

impl Memento {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn update(&self, key: &str, value: Option<Value>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// State handed to an extension for the duration of one activation.
///
/// Holds the storage paths carved out for the extension, its two mementos,
/// and the subscription list that deactivation drains.
pub struct ExtensionContext {
    extension_id: String,
    extension_path: PathBuf,
    storage_path: PathBuf,
    global_storage_path: PathBuf,
    workspace_state: Memento,
    global_state: Memento,
    subscriptions: Mutex<Vec<Disposable>>,
}

impl ExtensionContext {
    /// Build a context rooted at `storage_root`, creating the extension's
    /// workspace and global storage directories.
    pub fn create(
        extension_id: &str,
        extension_path: &Path,
        storage_root: &Path,
    ) -> Result<Self> {
        let storage_path = storage_root.join("workspace-storage").join(extension_id);
        let global_storage_path = storage_root.join("global-storage").join(extension_id);
        std::fs::create_dir_all(&storage_path).map_err(|e| Error::io(&storage_path, e))?;
        std::fs::create_dir_all(&global_storage_path)
            .map_err(|e| Error::io(&global_storage_path, e))?;

        Ok(Self {
            extension_id: extension_id.to_string(),
            extension_path: extension_path.to_path_buf(),
            storage_path,
            global_storage_path,
            workspace_state: Memento::new(),
            global_state: Memento::new(),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn global_storage_path(&self) -> &Path {
        &self.global_storage_path
    }

    pub fn workspace_state(&self) -> &Memento {
        &self.workspace_state
    }

    pub fn global_state(&self) -> &Memento {
        &self.global_state
    }

    /// Record a disposable to be cleaned up at deactivation.
    pub fn push_subscription(&self, disposable: Disposable) {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(disposable);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Dispose and drop every recorded subscription.
    pub fn dispose_subscriptions(&self) {
        let drained: Vec<Disposable> = {
            let mut subscriptions = self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions.drain(..).collect()
        };
        if !drained.is_empty() {
            tracing::debug!(
                extension = %self.extension_id,
                count = drained.len(),
                "disposing extension subscriptions"
            );
        }
        for disposable in drained {
            disposable.dispose();
        }
    }
}

impl std::fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("extension_id", &self.extension_id)
            .field("extension_path", &self.extension_path)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
