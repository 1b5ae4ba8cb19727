//! Persisted extension settings.
//!
//! Settings are dotted keys (`acme.retries`) mapped to arbitrary JSON values,
//! stored in a single pretty-printed JSON file. Contributed configuration
//! schemas supply defaults for keys that have never been set; resolving those
//! defaults is the compatibility layer's job, this store only holds explicit
//! values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default settings filename inside the host data directory.
pub const SETTINGS_FILENAME: &str = "extension-settings.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    settings: BTreeMap<String, serde_json::Value>,
}

/// Key-value settings store with optional JSON file persistence.
///
/// All reads come from memory; mutations save the whole file. A store without
/// a backing path keeps values in memory only.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl SettingsStore {
    /// Load a store from a JSON file, starting empty when the file is absent.
    ///
    /// An unreadable or unparsable file is treated as empty with a logged
    /// warning; the next successful `set` rewrites it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SettingsFile>(&content) {
                Ok(file) => file.settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable settings file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    /// A store with no persistence.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    /// The default settings path under the host data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".extension-host").join(SETTINGS_FILENAME))
    }

    /// The stored value for a key, if one was ever set.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().get(key).cloned()
    }

    /// Store a value under a key and persist.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) -> Result<()> {
        let snapshot = {
            let mut values = self.lock();
            values.insert(key.into(), value);
            values.clone()
        };
        self.save(&snapshot)
    }

    /// Remove a key, reverting it to its contributed default, and persist.
    pub fn reset(&self, key: &str) -> Result<()> {
        let snapshot = {
            let mut values = self.lock();
            values.remove(key);
            values.clone()
        };
        self.save(&snapshot)
    }

    /// Snapshot of all explicitly stored settings.
    pub fn all(&self) -> BTreeMap<String, serde_json::Value> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, serde_json::Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, values: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = SettingsFile {
            settings: values.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, content).map_err(|e| Error::io(path.as_path(), e))
    }
}
