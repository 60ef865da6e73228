//! Tracking messages and categories
//!
//! A message is a free-form JSON object. The tracker only reads and writes a
//! handful of well-known keys; everything else passes through untouched.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Free-form tracking payload
pub type Message = Map<String, Value>;

/// Visitor UUID
pub const KEY_UUID: &str = "uuid";

/// Host-assigned customer id
pub const KEY_CLIENT_CUSTOM_ID: &str = "clientCustomId";

/// Customer email
pub const KEY_EMAIL: &str = "email";

/// Originating IP address
pub const KEY_IP: &str = "ip";

/// Session-scoped id
pub const KEY_SSUID: &str = "ssuid";

/// Browser user agent
pub const KEY_USER_AGENT: &str = "userAgent";

/// Parameters decoded from the `_snrs_params` cookie
pub const KEY_SNR_PARAMS: &str = "snr_params";

/// Event time in epoch milliseconds
pub const KEY_TIME: &str = "time";

/// Event-specific parameters
pub const KEY_PARAMS: &str = "params";

/// Event label
pub const KEY_LABEL: &str = "label";

/// Event action
pub const KEY_ACTION: &str = "action";

/// Event category path (`client.web.browser...`)
pub const KEY_CATEGORY: &str = "category";

/// Producer category
///
/// Each category owns one queue. The serialized form is the tag used by
/// [`Producer::tagged_queue`](crate::Producer::tagged_queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Profile updates
    Client,
    /// Behavioural events
    Event,
    /// Purchases
    Transaction,
}

impl Category {
    /// Order in which queues are merged into a batch
    pub const FLUSH_ORDER: [Category; 3] = [Category::Event, Category::Transaction, Category::Client];

    /// Queue tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Event => "event",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for tracking messages
///
/// ```
/// use snrs_tracker::MessageBuilder;
///
/// let msg = MessageBuilder::new()
///     .label("Home")
///     .action("page.visit")
///     .param("url", "https://example.com/")
///     .build();
///
/// assert_eq!(msg["label"], "Home");
/// assert_eq!(msg["params"]["url"], "https://example.com/");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    fields: Message,
    params: Message,
}

impl MessageBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label
    #[must_use]
    pub fn label(self, label: impl Into<String>) -> Self {
        self.field(KEY_LABEL, label.into())
    }

    /// Set the action
    #[must_use]
    pub fn action(self, action: impl Into<String>) -> Self {
        self.field(KEY_ACTION, action.into())
    }

    /// Set the category path
    #[must_use]
    pub fn category(self, category: impl Into<String>) -> Self {
        self.field(KEY_CATEGORY, category.into())
    }

    /// Set the visitor UUID explicitly
    #[must_use]
    pub fn uuid(self, uuid: impl Into<String>) -> Self {
        self.field(KEY_UUID, uuid.into())
    }

    /// Set the event time in epoch seconds
    ///
    /// Moved to the top-level `time` field (in milliseconds) on enqueue.
    #[must_use]
    pub fn time(self, epoch_secs: i64) -> Self {
        self.param(KEY_TIME, epoch_secs)
    }

    /// Set a top-level field
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set one parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Merge a set of parameters, later keys win
    #[must_use]
    pub fn params(mut self, params: Message) -> Self {
        self.params.extend(params);
        self
    }

    /// Build the message
    ///
    /// `params` is only present when at least one parameter was set.
    pub fn build(self) -> Message {
        let Self { mut fields, params } = self;
        if !params.is_empty() {
            fields.insert(KEY_PARAMS.to_string(), Value::Object(params));
        }
        fields
    }
}
