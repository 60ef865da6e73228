//! Tracker configuration
//!
//! Endpoints, credentials and timeouts for the tracking client.
//!
//! # Defaults
//!
//! - `batch_url`: `http://tck.synerise.com/sdk-proxy` (queued batches, POST)
//! - `tracker_url`: `http://tck.synerise.com/tracker` (single events, PUT)
//! - `api_version`: `3.0`
//! - `batch_timeout`: 5s
//! - `event_timeout`: 1s, so a tracking call never meaningfully delays a page
//!
//! `api_key` has no default and must be set.

use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

/// Default JSON content type for outbound requests
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Default accept header for outbound requests
pub const DEFAULT_ACCEPT_HEADER: &str = "application/json";

/// SDK name sent as the user agent product token
pub const DEFAULT_USER_AGENT: &str = "synerise-php-sdk";

/// Default API version header value
pub const DEFAULT_API_VERSION: &str = "3.0";

/// Default batch tracking endpoint
pub const DEFAULT_BATCH_URL: &str = "http://tck.synerise.com/sdk-proxy";

/// Default single-event tracking endpoint (API key is appended as a path segment)
pub const DEFAULT_TRACKER_URL: &str = "http://tck.synerise.com/tracker";

/// Tracker configuration
///
/// # Example
///
/// ```toml
/// [tracker]
/// api_key = "3f1d..."
/// api_version = "3.0"
/// batch_timeout = "5s"
/// event_timeout = "1s"
///
/// [tracker.headers]
/// X-Tenant = "shop-eu"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerConfig {
    /// API key sent as `Api-Key` and used in the single-event URL
    pub api_key: String,

    /// API version sent as `Api-Version` and in the user agent
    pub api_version: String,

    /// Product token for the `User-Agent` header
    pub user_agent: String,

    /// Endpoint receiving flushed batches
    pub batch_url: String,

    /// Endpoint receiving immediate single events
    pub tracker_url: String,

    /// Timeout for a batch flush
    #[serde(with = "humantime_serde")]
    pub batch_timeout: Duration,

    /// Timeout for a single immediate event
    #[serde(with = "humantime_serde")]
    pub event_timeout: Duration,

    /// Extra headers merged over the defaults
    pub headers: IndexMap<String, String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            batch_url: DEFAULT_BATCH_URL.to_string(),
            tracker_url: DEFAULT_TRACKER_URL.to_string(),
            batch_timeout: Duration::from_secs(5),
            event_timeout: Duration::from_secs(1),
            headers: IndexMap::new(),
        }
    }
}

impl TrackerConfig {
    /// Create a config with the given API key and defaults for everything else
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the batch endpoint
    #[must_use]
    pub fn with_batch_url(mut self, url: impl Into<String>) -> Self {
        self.batch_url = url.into();
        self
    }

    /// Set the single-event endpoint
    #[must_use]
    pub fn with_tracker_url(mut self, url: impl Into<String>) -> Self {
        self.tracker_url = url.into();
        self
    }

    /// Set the batch flush timeout
    #[must_use]
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Set the single-event timeout
    #[must_use]
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    /// Add an extra outbound header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// `User-Agent` value: `<sdk-name>/<api-version>`
    pub fn user_agent_header(&self) -> String {
        format!("{}/{}", self.user_agent, self.api_version)
    }

    /// Full URL for the immediate single-event endpoint
    pub fn event_url(&self) -> String {
        format!("{}/{}", self.tracker_url.trim_end_matches('/'), self.api_key)
    }

    /// Outbound header set
    ///
    /// Defaults first, then configured extras, then the credential and
    /// version headers, which always win.
    pub fn headers(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());
        headers.insert("Accept".to_string(), DEFAULT_ACCEPT_HEADER.to_string());

        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }

        headers.insert("User-Agent".to_string(), self.user_agent_header());
        headers.insert("Api-Version".to_string(), self.api_version.clone());
        headers.insert("Api-Key".to_string(), self.api_key.clone());
        headers
    }
}
