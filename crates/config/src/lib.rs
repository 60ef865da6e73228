//! snrs tracker configuration
//!
//! TOML-based configuration loading with sensible defaults. Only the API key
//! is required; everything else falls back to the production endpoints.
//!
//! # Parsing
//!
//! ```
//! use snrs_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[tracker]\napi_key = \"abc\"").unwrap();
//! assert_eq!(config.tracker.api_key, "abc");
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [tracker]
//! api_key = "abc"
//! api_version = "3.0"
//! batch_url = "http://tck.synerise.com/sdk-proxy"
//! tracker_url = "http://tck.synerise.com/tracker"
//! batch_timeout = "5s"
//! event_timeout = "1s"
//!
//! [log]
//! level = "warn"
//! format = "json"
//! ```

mod error;
mod logging;
mod tracker;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use tracker::{
    DEFAULT_ACCEPT_HEADER, DEFAULT_API_VERSION, DEFAULT_BATCH_URL,
    DEFAULT_CONTENT_TYPE, DEFAULT_TRACKER_URL, DEFAULT_USER_AGENT, TrackerConfig,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, but validation requires
/// `tracker.api_key`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoints, credentials and timeouts
    pub tracker: TrackerConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Build a validated configuration around an already-populated tracker section
    ///
    /// # Errors
    ///
    /// Returns error if the tracker section fails validation.
    pub fn from_tracker(tracker: TrackerConfig) -> Result<Self> {
        let config = Self {
            tracker,
            log: LogConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
