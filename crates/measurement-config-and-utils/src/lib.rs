//! Configuration, filesystem layout, and logging setup for the measurement crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_ENDPOINT, DEFAULT_LOG_LEVEL, DEFAULT_SESSION_TIMEOUT_SECS,
    DEFAULT_UPLOAD_INTERVAL_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
