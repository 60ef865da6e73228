//! Message enrichment
//!
//! Every queued message passes through [`Enricher::enrich`] before it is
//! stored. Steps, in order:
//!
//! 1. `clientCustomId`, `email` and `uuid` from the explicit client identity
//! 2. `uuid` from the identity store when the message has none
//! 3. `ip`, `ssuid`, `userAgent` and `snr_params` from the request
//! 4. `params.time` (epoch seconds) moved to top-level `time` in milliseconds
//!
//! Request-derived fields only fill gaps; they never overwrite a non-null
//! value already on the message. The explicit client identity always wins.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use snrs_identity::{IdentityStore, RequestContext};

use crate::error::{Result, TrackerError};
use crate::message::{
    KEY_CLIENT_CUSTOM_ID, KEY_EMAIL, KEY_IP, KEY_PARAMS, KEY_SNR_PARAMS, KEY_SSUID, KEY_TIME,
    KEY_USER_AGENT, KEY_UUID, Message,
};

/// Address reported when the client address cannot be determined
pub const UNKNOWN_IP: &str = "0.0.0.0";

const TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Identity the host has established for the current customer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Host-assigned customer id
    pub custom_id: Option<String>,
    /// Customer email
    pub email: Option<String>,
    /// Visitor UUID overriding the cookie-derived one
    pub uuid: Option<String>,
}

impl ClientIdentity {
    /// Whether nothing has been set
    pub fn is_empty(&self) -> bool {
        self.custom_id.is_none() && self.email.is_none() && self.uuid.is_none()
    }
}

/// Enriches messages from the identity store and request context
#[derive(Debug)]
pub struct Enricher {
    store: Arc<IdentityStore>,
    client: RwLock<ClientIdentity>,
}

impl Enricher {
    /// Create an enricher over an identity store
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self {
            store,
            client: RwLock::new(ClientIdentity::default()),
        }
    }

    /// Identity store backing this enricher
    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }

    /// Snapshot of the explicit client identity
    pub fn client_identity(&self) -> ClientIdentity {
        self.client.read().clone()
    }

    /// Modify the explicit client identity
    pub fn update_client_identity(&self, f: impl FnOnce(&mut ClientIdentity)) {
        f(&mut self.client.write());
    }

    /// Forget the explicit client identity
    pub fn clear_client_identity(&self) {
        *self.client.write() = ClientIdentity::default();
    }

    /// Enrich a message using the current time as default
    pub fn enrich(&self, message: Message) -> Result<Message> {
        self.enrich_at(message, Utc::now().timestamp_millis())
    }

    /// Enrich a message, using `now_ms` when it carries no time
    ///
    /// Time is validated before anything else so an invalid message causes
    /// no cookie writes.
    pub fn enrich_at(&self, mut message: Message, now_ms: i64) -> Result<Message> {
        let time_ms = take_time(&mut message)?.unwrap_or(now_ms);
        let client = self.client_identity();
        let ctx: &dyn RequestContext = &**self.store.context();

        if let Some(id) = client.custom_id {
            message.insert(KEY_CLIENT_CUSTOM_ID.to_string(), Value::String(id));
        }
        if let Some(email) = client.email {
            message.insert(KEY_EMAIL.to_string(), Value::String(email));
        }
        match client.uuid {
            Some(uuid) => {
                message.insert(KEY_UUID.to_string(), Value::String(uuid));
            }
            None if is_blank(message.get(KEY_UUID)) => {
                let uuid = self.store.get_or_create_uuid();
                message.insert(KEY_UUID.to_string(), Value::String(uuid));
            }
            None => {}
        }

        fill(&mut message, KEY_IP, Value::String(client_ip(ctx)));
        if let Some(ssuid) = self.store.ssuid() {
            fill(&mut message, KEY_SSUID, Value::String(ssuid));
        }
        if let Some(agent) = user_agent(ctx) {
            fill(&mut message, KEY_USER_AGENT, Value::String(agent));
        }
        if let Some(params) = self.store.snr_params() {
            fill(&mut message, KEY_SNR_PARAMS, params);
        }

        message.insert(KEY_TIME.to_string(), Value::from(time_ms));
        Ok(message)
    }
}

/// Client address from the request
///
/// `Client-IP`, then the first hop of `X-Forwarded-For`, then the peer
/// address, else [`UNKNOWN_IP`].
pub fn client_ip(ctx: &dyn RequestContext) -> String {
    ctx.header("client-ip")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            ctx.header("x-forwarded-for")
                .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
                .filter(|v| !v.is_empty())
        })
        .or_else(|| ctx.remote_addr().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn user_agent(ctx: &dyn RequestContext) -> Option<String> {
    ctx.header("user-agent").filter(|v| !v.is_empty())
}

/// Parse an epoch-seconds timestamp
///
/// Accepts integers, integral floats and integer strings whose value
/// survives a `dd-mm-YYYY HH:MM:SS` format/parse round trip.
pub fn parse_epoch_secs(value: &Value) -> Option<i64> {
    let secs = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    let formatted = DateTime::<Utc>::from_timestamp(secs, 0)?
        .format(TIME_FORMAT)
        .to_string();
    let parsed = NaiveDateTime::parse_from_str(&formatted, TIME_FORMAT).ok()?;
    (parsed.and_utc().timestamp() == secs).then_some(secs)
}

/// Remove `params.time` and return it in milliseconds
fn take_time(message: &mut Message) -> Result<Option<i64>> {
    let Some(Value::Object(params)) = message.get_mut(KEY_PARAMS) else {
        return Ok(None);
    };
    match params.get(KEY_TIME) {
        None | Some(Value::Null) => return Ok(None),
        Some(_) => {}
    }

    let millis = params
        .get(KEY_TIME)
        .and_then(parse_epoch_secs)
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or_else(|| TrackerError::validation(KEY_TIME, "must be a timestamp"))?;
    params.shift_remove(KEY_TIME);
    Ok(Some(millis))
}

/// Whether a field is absent, null or an empty string
pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn fill(message: &mut Message, key: &str, value: Value) {
    if matches!(message.get(key), None | Some(Value::Null)) {
        message.insert(key.to_string(), value);
    }
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod enrich_test;
