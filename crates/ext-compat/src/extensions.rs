//! The `extensions` namespace: lookup of other active extensions.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use ext_runtime::ExtensionRuntime;

/// Identity and exports of an active extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionInfo {
    pub id: String,
    pub version: String,
    pub extension_path: PathBuf,
    pub exports: Value,
}

/// The `extensions` capability group.
pub struct ExtensionsApi {
    runtime: Arc<ExtensionRuntime>,
}

impl ExtensionsApi {
    pub(crate) fn new(runtime: Arc<ExtensionRuntime>) -> Self {
        Self { runtime }
    }

    /// Look up an active extension by id; inactive extensions yield `None`.
    pub fn get_extension(&self, extension_id: &str) -> Option<ExtensionInfo> {
        self.runtime.active_extension(extension_id).map(|record| ExtensionInfo {
            id: record.id().to_string(),
            version: record.manifest().version.clone(),
            extension_path: record.context().extension_path().to_path_buf(),
            exports: record.exports(),
        })
    }

    /// All active extensions, sorted by id.
    pub fn all(&self) -> Vec<ExtensionInfo> {
        self.runtime
            .active_extensions()
            .iter()
            .filter_map(|id| self.get_extension(id))
            .collect()
    }
}
