//! Logging initialization.
//!
//! Thin wrapper over the observability crate so the binary and embedding
//! applications configure logging the same way.

use observability::{init_with_config, LogConfig};
use std::path::PathBuf;

/// Initialize logging for the measurement service.
///
/// Structured JSONL goes to the default log file; compact logs are also
/// written to stderr. `RUST_LOG` overrides `level`.
pub fn init_logging(level: &str) {
    init_logging_for_service("measurement", level, None);
}

/// Initialize logging with a custom service name and optional log file.
pub fn init_logging_for_service(service_name: &str, level: &str, log_path: Option<PathBuf>) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level. Unknown values map to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
