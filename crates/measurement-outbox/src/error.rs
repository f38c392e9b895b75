//! Outbox error types.

use std::error::Error as StdError;
use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// `start` called while the worker is running.
    #[error("Background requester is already started")]
    AlreadyStarted,

    /// `stop` called while no worker is running.
    #[error("Background requester is not started")]
    NotStarted,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Send failed for a transport-specific reason.
    #[error("Send failed: {0}")]
    Send(String),

    /// The worker thread could not be spawned.
    #[error("Failed to spawn worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Innermost error in a `source()` chain.
pub fn root_cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}
