//! [`LocalBackend`]: a [`HostBackend`] over the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::backend::{
    DirectoryEntry, FileReadResult, FileWriteResult, HostBackend, SearchMatch, SearchResult,
    WriteOptions,
};
use crate::checksum::content_checksum;
use crate::error::{Error, Result};

/// Maximum number of matches returned by a single search.
const SEARCH_MATCH_LIMIT: usize = 200;

/// Local filesystem backend rooted at a workspace directory.
///
/// Relative paths resolve against the workspace root; absolute paths are used
/// as given. Uses `tokio::fs` for all I/O.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    workspace_root: PathBuf,
}

impl LocalBackend {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

#[async_trait]
impl HostBackend for LocalBackend {
    async fn read_file(&self, path: &Path) -> Result<FileReadResult> {
        let full = self.resolve(path);
        let content = tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(full.clone())
            } else {
                Error::io(&full, e)
            }
        })?;

        let hash = content_checksum(&content);
        let size = content.len() as u64;
        Ok(FileReadResult {
            content,
            hash,
            size,
        })
    }

    async fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        options: WriteOptions,
    ) -> Result<FileWriteResult> {
        let full = self.resolve(path);
        let existed = full.exists();

        if existed && !options.overwrite {
            return Err(Error::AlreadyExists(full));
        }
        if options.create_dirs {
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io(parent, e))?;
            }
        }

        tokio::fs::write(&full, content)
            .await
            .map_err(|e| Error::io(&full, e))?;

        Ok(FileWriteResult {
            path: full,
            hash: content_checksum(content),
            created: !existed,
            bytes_written: content.len(),
        })
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>> {
        let full = self.resolve(path);
        let mut reader = tokio::fs::read_dir(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(full.clone())
            } else {
                Error::io(&full, e)
            }
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| Error::io(&full, e))? {
            let metadata = entry.metadata().await.map_err(|e| Error::io(entry.path(), e))?;
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn search_files(&self, root: &Path, query: &str) -> Result<SearchResult> {
        let full = self.resolve(root);
        if !full.exists() {
            return Err(Error::NotFound(full));
        }

        let mut result = SearchResult::default();
        let mut pending = vec![full];
        while let Some(dir) = pending.pop() {
            let mut reader = match tokio::fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) => {
                    tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            while let Some(entry) = reader.next_entry().await.map_err(|e| Error::io(&dir, e))? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(text) = tokio::fs::read_to_string(&path).await else {
                    continue; // binary or unreadable
                };
                for (line_idx, line) in text.lines().enumerate() {
                    if line.contains(query) {
                        if result.matches.len() >= SEARCH_MATCH_LIMIT {
                            result.truncated = true;
                            return Ok(result);
                        }
                        result.matches.push(SearchMatch {
                            path: path.clone(),
                            line: line_idx + 1,
                            text: line.to_string(),
                        });
                    }
                }
            }
        }
        Ok(result)
    }
}
