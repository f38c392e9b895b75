//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default Measurement Protocol collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.google-analytics.com/collect";

/// Default inactivity timeout before a hit starts a new session.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;

/// Default pause between background queue drains.
pub const DEFAULT_UPLOAD_INTERVAL_SECS: u64 = 5;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `log_level`.
const ENV_LOG_LEVEL: &str = "MEASUREMENT_LOG_LEVEL";
/// Environment variable overriding `property_id`.
const ENV_PROPERTY_ID: &str = "MEASUREMENT_PROPERTY_ID";
/// Environment variable overriding `endpoint`.
const ENV_ENDPOINT: &str = "MEASUREMENT_ENDPOINT";

/// Tracking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Analytics property the hits are recorded against (e.g. `UA-12345-1`).
    #[serde(default)]
    pub property_id: String,
    /// Application name reported with every hit.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Application version reported with every hit.
    #[serde(default)]
    pub app_version: Option<String>,
    /// Collection endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Percentage of new visitors to track, in `[0, 100]`.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Inactivity timeout in seconds. `None` disables automatic session rollover.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: Option<u64>,
    /// Seconds between background queue drains.
    #[serde(default = "default_upload_interval_secs")]
    pub upload_interval_secs: u64,
    /// Ask the collector to anonymize the sender's IP address.
    #[serde(default)]
    pub anonymize_ip: bool,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// User-Agent header sent with tracking requests.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_sample_rate() -> f64 {
    100.0
}

fn default_session_timeout_secs() -> Option<u64> {
    Some(DEFAULT_SESSION_TIMEOUT_SECS)
}

fn default_upload_interval_secs() -> u64 {
    DEFAULT_UPLOAD_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            property_id: String::new(),
            app_name: None,
            app_version: None,
            endpoint: default_endpoint(),
            sample_rate: default_sample_rate(),
            session_timeout_secs: default_session_timeout_secs(),
            upload_interval_secs: default_upload_interval_secs(),
            anonymize_ip: false,
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(property_id) = lookup(ENV_PROPERTY_ID) {
            self.property_id = property_id;
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
    }

    /// Check value ranges and that the endpoint parses.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=100.0).contains(&self.sample_rate) {
            return Err(CoreError::InvalidConfig {
                field: "sample_rate",
                reason: format!("{} is outside [0, 100]", self.sample_rate),
            });
        }
        if self.upload_interval_secs == 0 {
            return Err(CoreError::InvalidConfig {
                field: "upload_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.endpoint()?;
        Ok(())
    }

    /// Get the endpoint as a parsed URL.
    pub fn endpoint(&self) -> CoreResult<Url> {
        Url::parse(&self.endpoint).map_err(CoreError::from)
    }

    /// Session inactivity timeout, if enabled.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_secs.map(Duration::from_secs)
    }

    /// Pause between background queue drains.
    pub fn upload_interval(&self) -> Duration {
        Duration::from_secs(self.upload_interval_secs)
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
