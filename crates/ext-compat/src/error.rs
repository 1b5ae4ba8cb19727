//! Error types for the compatibility API surface.

/// Errors surfaced to extension code through the compatibility API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A runtime operation failed.
    #[error(transparent)]
    Runtime(#[from] ext_runtime::Error),

    /// A backend (filesystem or settings) operation failed.
    #[error(transparent)]
    Backend(#[from] ext_backend::Error),

    /// A string could not be parsed as a URI.
    #[error("invalid URI: {0}")]
    InvalidUri(String),
}

/// Result alias for compatibility API operations.
pub type Result<T> = std::result::Result<T, Error>;
