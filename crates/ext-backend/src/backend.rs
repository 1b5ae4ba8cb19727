//! The [`HostBackend`] trait and its result envelopes.
//!
//! The extension core talks to the host application through this boundary.
//! File reads and writes carry content hashes so callers can detect drift;
//! git and terminal operations exist as typed envelopes for host UI consumers
//! and may be left unsupported by a given backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Result of reading a file through the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReadResult {
    /// Raw file content.
    pub content: Vec<u8>,
    /// Canonical `sha256:<hex>` hash of the content.
    pub hash: String,
    /// Content length in bytes.
    pub size: u64,
}

/// Options for [`HostBackend::write_file`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOptions {
    /// Create missing parent directories.
    pub create_dirs: bool,
    /// Replace an existing file; when false, writing over an existing path
    /// fails with [`Error::AlreadyExists`].
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            create_dirs: true,
            overwrite: true,
        }
    }
}

/// Result of writing a file through the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWriteResult {
    /// The path that was written.
    pub path: PathBuf,
    /// Canonical `sha256:<hex>` hash of the written content.
    pub hash: String,
    /// Whether the file was newly created.
    pub created: bool,
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// One entry from a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
}

/// One match from a file content search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based line number of the match.
    pub line: usize,
    /// The matched line, trimmed of the trailing newline.
    pub text: String,
}

/// Result envelope for a file search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
    /// True when the match limit was hit before the walk finished.
    pub truncated: bool,
}

/// One changed path in a git status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitChange {
    pub path: PathBuf,
    /// Porcelain-style status code (e.g. `M`, `A`, `??`).
    pub status: String,
}

/// Result envelope for a git status query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatusResult {
    pub branch: Option<String>,
    pub changes: Vec<GitChange>,
}

/// Result envelope for a terminal command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Generic invocation boundary between the extension core and the host.
///
/// File operations are the only ones the core itself exercises (through the
/// compatibility layer's filesystem proxy); the remaining operations are
/// envelopes for host UI consumers. Default implementations report
/// [`Error::Unsupported`] so a backend only has to implement what its host
/// actually offers.
#[async_trait]
pub trait HostBackend: Send + Sync {
    /// Read a file. A missing path fails with [`Error::NotFound`], never an
    /// empty buffer.
    async fn read_file(&self, path: &Path) -> Result<FileReadResult>;

    /// Write a file, honoring [`WriteOptions`].
    async fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        options: WriteOptions,
    ) -> Result<FileWriteResult>;

    /// List the entries of a directory, non-recursively, in name order.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>>;

    /// Search file contents under a root for a literal query string.
    async fn search_files(&self, root: &Path, query: &str) -> Result<SearchResult> {
        let _ = (root, query);
        Err(Error::Unsupported {
            operation: "search_files",
        })
    }

    /// Report the git status of a repository.
    async fn git_status(&self, repo: &Path) -> Result<GitStatusResult> {
        let _ = repo;
        Err(Error::Unsupported {
            operation: "git_status",
        })
    }

    /// Stage paths in a repository.
    async fn git_stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<()> {
        let _ = (repo, paths);
        Err(Error::Unsupported {
            operation: "git_stage",
        })
    }

    /// Create a commit from the staged changes.
    async fn git_commit(&self, repo: &Path, message: &str) -> Result<String> {
        let _ = (repo, message);
        Err(Error::Unsupported {
            operation: "git_commit",
        })
    }

    /// Produce a unified diff for a path, or the whole tree when `None`.
    async fn git_diff(&self, repo: &Path, path: Option<&Path>) -> Result<String> {
        let _ = (repo, path);
        Err(Error::Unsupported {
            operation: "git_diff",
        })
    }

    /// Execute a command in the host terminal.
    async fn terminal_execute(&self, command: &str, cwd: &Path) -> Result<TerminalResult> {
        let _ = (command, cwd);
        Err(Error::Unsupported {
            operation: "terminal_execute",
        })
    }
}
