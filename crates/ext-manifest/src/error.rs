use std::path::PathBuf;

/// Errors that can occur while reading extension manifests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse extension manifest JSON.
    #[error("failed to parse extension manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// Extension manifest file not found at the expected path.
    #[error("extension manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Manifest is missing a required field or has an invalid value.
    #[error("invalid extension manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Invalid extension identifier.
    #[error("invalid extension id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// I/O error reading extension files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
