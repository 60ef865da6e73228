//! Tracker error types
//!
//! Only [`TrackerError::Validation`] reaches callers during normal tracking.
//! Transport failures are contained inside flush and single-event sends and
//! surface as outcomes, never as errors.

use std::time::Duration;

use snrs_config::ConfigError;
use thiserror::Error;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors returned to SDK callers
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Caller-supplied message data is invalid
    #[error("{field} {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Tracker configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl TrackerError {
    /// Create a Validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Errors raised by an HTTP transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection or protocol failure
    #[error("network error: {0}")]
    Network(String),

    /// Request did not complete in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Request body could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}
