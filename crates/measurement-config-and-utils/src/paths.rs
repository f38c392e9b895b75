//! File system paths for persisted measurement state.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".measurement";

/// Locations of the config file, persisted state, and logs.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.measurement)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.measurement`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir().ok_or(CoreError::NoHomeDir)?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the persisted session state path (session-state.json).
    pub fn session_state_file(&self) -> PathBuf {
        self.base_dir.join("session-state.json")
    }

    /// Get the persisted unsent request list path (unsent-requests.json).
    pub fn unsent_requests_file(&self) -> PathBuf {
        self.base_dir.join("unsent-requests.json")
    }

    /// Get the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("measurement.jsonl")
    }

    /// Ensure the base and logs directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
