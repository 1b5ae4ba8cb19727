//! The `workspace` namespace: configuration, filesystem proxy, folders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use ext_backend::{HostBackend, SettingsStore, WriteOptions};
use ext_manifest::SharedContributionIndex;

use crate::enums::{ConfigurationTarget, FileType};
use crate::error::Result;
use crate::uri::Uri;

/// One root folder of the hosting workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub uri: Uri,
    pub name: String,
    pub index: usize,
}

/// Filesystem proxy backed by the host's file operations.
#[derive(Clone)]
pub struct FsApi {
    backend: Arc<dyn HostBackend>,
}

impl FsApi {
    pub(crate) fn new(backend: Arc<dyn HostBackend>) -> Self {
        Self { backend }
    }

    /// Read a file as raw bytes. A nonexistent path fails with the backend's
    /// not-found error rather than returning empty content.
    pub async fn read_file(&self, uri: &Uri) -> Result<Vec<u8>> {
        let result = self.backend.read_file(&uri.fs_path()).await?;
        Ok(result.content)
    }

    /// Write raw bytes, creating parent directories and replacing existing
    /// content.
    pub async fn write_file(&self, uri: &Uri, content: &[u8]) -> Result<()> {
        self.backend
            .write_file(
                &uri.fs_path(),
                content,
                WriteOptions {
                    create_dirs: true,
                    overwrite: true,
                },
            )
            .await?;
        Ok(())
    }

    /// List a directory as `(name, file type)` pairs, sorted by name.
    pub async fn read_directory(&self, uri: &Uri) -> Result<Vec<(String, FileType)>> {
        let entries = self.backend.list_directory(&uri.fs_path()).await?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let file_type = if entry.is_dir {
                    FileType::Directory
                } else {
                    FileType::File
                };
                (entry.name, file_type)
            })
            .collect())
    }
}

/// Read/write view over one configuration section.
#[derive(Clone)]
pub struct ConfigurationAccessor {
    section: Option<String>,
    settings: Arc<SettingsStore>,
    contributions: Arc<SharedContributionIndex>,
}

impl ConfigurationAccessor {
    fn full_key(&self, key: &str) -> String {
        match &self.section {
            Some(section) => format!("{section}.{key}"),
            None => key.to_string(),
        }
    }

    /// The stored value for `key`, falling back to the default declared by
    /// any indexed configuration contribution.
    pub fn get(&self, key: &str) -> Option<Value> {
        let full_key = self.full_key(key);
        self.settings.get(&full_key).or_else(|| {
            self.contributions
                .snapshot()
                .configuration_default(&full_key)
                .cloned()
        })
    }

    pub fn get_or(&self, key: &str, fallback: Value) -> Value {
        self.get(key).unwrap_or(fallback)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Persist a value (`None` removes the key). All targets write to the
    /// single host settings store.
    pub async fn update(
        &self,
        key: &str,
        value: Option<Value>,
        _target: ConfigurationTarget,
    ) -> Result<()> {
        let full_key = self.full_key(key);
        match value {
            Some(value) => self.settings.set(full_key, value)?,
            None => self.settings.reset(&full_key)?,
        }
        Ok(())
    }
}

/// The `workspace` capability group.
pub struct WorkspaceApi {
    settings: Arc<SettingsStore>,
    contributions: Arc<SharedContributionIndex>,
    folders: Vec<WorkspaceFolder>,
    fs: FsApi,
}

impl WorkspaceApi {
    pub(crate) fn new(
        backend: Arc<dyn HostBackend>,
        settings: Arc<SettingsStore>,
        contributions: Arc<SharedContributionIndex>,
        folder_paths: &[PathBuf],
    ) -> Self {
        let folders = folder_paths
            .iter()
            .enumerate()
            .map(|(index, path)| WorkspaceFolder {
                uri: Uri::file(path),
                name: folder_name(path),
                index,
            })
            .collect();
        Self {
            settings,
            contributions,
            folders,
            fs: FsApi::new(backend),
        }
    }

    /// Configuration view for a dotted section prefix, or the root view.
    pub fn get_configuration(&self, section: Option<&str>) -> ConfigurationAccessor {
        ConfigurationAccessor {
            section: section.map(str::to_string),
            settings: Arc::clone(&self.settings),
            contributions: Arc::clone(&self.contributions),
        }
    }

    pub fn workspace_folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    pub fn fs(&self) -> &FsApi {
        &self.fs
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
