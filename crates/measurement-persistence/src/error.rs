use std::path::PathBuf;
use thiserror::Error;

/// Persistence error type.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Target path has no parent directory or file name.
    #[error("Invalid store path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type alias using PersistenceError.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
