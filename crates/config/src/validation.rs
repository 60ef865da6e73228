//! Configuration validation
//!
//! Checks the tracker section is usable:
//! - API key is present
//! - Endpoints are absolute http(s) URLs
//! - Timeouts are non-zero

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

const SECTION: &str = "tracker";

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let tracker = &config.tracker;

    if tracker.api_key.trim().is_empty() {
        return Err(ConfigError::missing_field(SECTION, "api_key"));
    }

    validate_url("batch_url", &tracker.batch_url)?;
    validate_url("tracker_url", &tracker.tracker_url)?;

    validate_timeout("batch_timeout", tracker.batch_timeout)?;
    validate_timeout("event_timeout", tracker.event_timeout)?;

    if tracker.api_version.trim().is_empty() {
        return Err(ConfigError::missing_field(SECTION, "api_version"));
    }

    Ok(())
}

fn validate_url(field: &'static str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            SECTION,
            field,
            format!("'{url}' must start with http:// or https://"),
        ))
    }
}

fn validate_timeout(field: &'static str, timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(ConfigError::invalid_value(SECTION, field, "must be non-zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackerConfig;

    fn config(tracker: TrackerConfig) -> Config {
        Config {
            tracker,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&config(TrackerConfig::new("key"))).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let err = validate_config(&config(TrackerConfig::new("  "))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "api_key",
                ..
            }
        ));
    }

    #[test]
    fn test_relative_url_rejected() {
        let tracker = TrackerConfig::new("key").with_batch_url("tck.synerise.com/sdk-proxy");
        let err = validate_config(&config(tracker)).unwrap_err();
        assert!(err.to_string().contains("batch_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let tracker = TrackerConfig::new("key").with_event_timeout(Duration::ZERO);
        let err = validate_config(&config(tracker)).unwrap_err();
        assert!(err.to_string().contains("event_timeout"));
    }
}
