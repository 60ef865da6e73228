//! Logging configuration
//!
//! Describes the `tracing` subscriber a host application may install for the
//! SDK's diagnostics. The SDK itself never installs one implicitly.

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    /// Default
    #[default]
    Info,
    Warn,
    Error,
    /// Silence the SDK entirely
    Off,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Write to stderr (default, keeps stdout free for the host)
    #[default]
    Stderr,
    /// Write to stdout
    Stdout,
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "warn"
/// format = "json"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Log level. Default: info
    pub level: LogLevel,

    /// Output format. Default: console
    pub format: LogFormat,

    /// Output destination. Default: stderr
    pub output: LogOutput,
}

impl LogConfig {
    /// Filter directive scoped to the SDK crates
    ///
    /// Other targets stay at `warn` so the host's own dependencies do not
    /// flood the output when the SDK is set to `debug`.
    pub fn directive(&self) -> String {
        let level = self.level.as_str();
        format!("warn,snrs_tracker={level},snrs_identity={level}")
    }
}
