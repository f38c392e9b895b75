use measurement_config_and_utils::CoreError;
use measurement_outbox::OutboxError;
use measurement_persistence::PersistenceError;
use measurement_protocol::ProtocolError;
use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] CoreError),

    /// Delivery engine error
    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),

    /// State store error
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// URI builder error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No property id configured, so nothing could be attributed.
    #[error("No property id configured")]
    MissingPropertyId,

    /// `start` called while already started.
    #[error("Client is already started")]
    AlreadyStarted,

    /// `stop` called while not started.
    #[error("Client is not started")]
    NotStarted,
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
