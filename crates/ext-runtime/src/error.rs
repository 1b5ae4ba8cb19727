//! Error types for the extension runtime.

use std::path::PathBuf;

/// Errors produced by runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The extension manifest could not be read or parsed during activation.
    #[error("failed to load extension manifest: {0}")]
    Manifest(#[from] ext_manifest::Error),

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An extension-supplied callback (command handler, entry point, tree
    /// data provider) reported a failure.
    #[error("extension callback failed: {message}")]
    Callback { message: String },
}

impl Error {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a callback error from any displayable failure.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }
}

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
