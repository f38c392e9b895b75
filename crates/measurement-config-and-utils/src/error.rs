use thiserror::Error;

/// Error type for configuration and filesystem layout operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A config value is outside its allowed range.
    #[error("Invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector endpoint does not parse as a URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Config file is not valid JSON for [`Config`](crate::Config).
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to place `~/.measurement` under.
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
