use thiserror::Error;

/// Protocol error type.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Collector endpoint could not be parsed.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Collector endpoint parsed but cannot carry a query string.
    #[error("Endpoint cannot carry query parameters: {0}")]
    UnsupportedEndpoint(String),

    /// Custom dimension or metric index outside `1..=MAX_CUSTOM_INDEX`.
    #[error("Custom slot index {0} out of range")]
    SlotOutOfRange(u16),
}

/// Result type alias using ProtocolError.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
