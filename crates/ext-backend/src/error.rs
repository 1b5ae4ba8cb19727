use std::path::PathBuf;

/// Errors crossing the host backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested path does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// The target exists and overwriting was not requested.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// I/O failure at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend does not implement this operation.
    #[error("operation not supported by this backend: {operation}")]
    Unsupported { operation: &'static str },

    /// Failed to serialize or deserialize persisted JSON.
    #[error("failed to parse persisted data: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
