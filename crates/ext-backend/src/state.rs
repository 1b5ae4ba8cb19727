//! Persisted webview state, keyed by a structured key.
//!
//! Webview panels can stash a state value so a reloaded surface resumes where
//! it left off. The key pairs the owning extension id with a panel key (the
//! panel's view type, which is stable across recreations) instead of a
//! concatenated display string, so keys cannot collide on separator
//! characters and tests can construct them directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structured storage key for per-panel state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Owning extension identity, `publisher.name`.
    pub extension_id: String,
    /// Stable panel key; panels use their view type so recreated panels
    /// resolve the same slot.
    pub panel_key: String,
}

impl StateKey {
    pub fn new(extension_id: impl Into<String>, panel_key: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            panel_key: panel_key.into(),
        }
    }

    /// Serialized form used only at the file boundary.
    fn file_key(&self) -> String {
        format!("{}/{}", self.extension_id, self.panel_key)
    }
}

/// Key-value store for webview state.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &StateKey) -> Option<serde_json::Value>;
    fn set(&self, key: &StateKey, value: serde_json::Value) -> Result<()>;
    fn remove(&self, key: &StateKey) -> Result<()>;
}

/// In-memory store; state survives panel reloads but not process restarts.
///
/// Used as the fallback when file persistence is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<StateKey, serde_json::Value>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &StateKey) -> Option<serde_json::Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &StateKey, value: serde_json::Value) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value);
        Ok(())
    }

    fn remove(&self, key: &StateKey) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON-file-backed store; the structured key is flattened to
/// `"<extension_id>/<panel_key>"` only inside the file.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    values: Mutex<HashMap<StateKey, serde_json::Value>>,
}

impl FileStateStore {
    /// Load a store from a JSON file, starting empty when absent or
    /// unparsable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut values = HashMap::new();
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, serde_json::Value>>(&content)
            {
                Ok(raw) => {
                    for (file_key, value) in raw {
                        if let Some((extension_id, panel_key)) = file_key.split_once('/') {
                            values.insert(StateKey::new(extension_id, panel_key), value);
                        } else {
                            tracing::debug!(key = %file_key, "discarding malformed state key");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable state file");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
            }
        }
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn save(&self, values: &HashMap<StateKey, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let raw: std::collections::BTreeMap<String, &serde_json::Value> = values
            .iter()
            .map(|(key, value)| (key.file_key(), value))
            .collect();
        let content = serde_json::to_string_pretty(&raw)?;
        std::fs::write(&self.path, content).map_err(|e| Error::io(self.path.as_path(), e))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &StateKey) -> Option<serde_json::Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &StateKey, value: serde_json::Value) -> Result<()> {
        let snapshot = {
            let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            values.insert(key.clone(), value);
            values.clone()
        };
        self.save(&snapshot)
    }

    fn remove(&self, key: &StateKey) -> Result<()> {
        let snapshot = {
            let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            values.remove(key);
            values.clone()
        };
        self.save(&snapshot)
    }
}
