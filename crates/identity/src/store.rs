//! Cookie-backed identity store
//!
//! One store lives for one request. It reads identity cookies through the
//! [`RequestContext`], keeps a local view that reflects its own writes, and
//! persists changes as long-lived cookies.
//!
//! # Cookies
//!
//! | Name           | Content                      | Access     |
//! |----------------|------------------------------|------------|
//! | `_snrs_uuid`   | visitor UUID                 | read/write |
//! | `_snrs_p`      | identity bag (`uuid`, `emailHash`, ...) | read/write |
//! | `_snrs_sa`     | session bag with `ssuid`     | read       |
//! | `_snrs_params` | JSON blob                    | read       |
//! | `_snrs_cl`     | scalar                       | read       |
//!
//! The visitor UUID is written to both `_snrs_uuid` and the bag's `uuid`
//! field. Once either location holds a value it is reused, never replaced by
//! a freshly generated one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{self, Decoded, IdentityBag};
use crate::context::{RequestContext, SetCookie};
use crate::error::{IdentityError, Result};
use crate::visitor_id::generate_uuid;

/// Scalar visitor UUID cookie
pub const SNRS_UUID: &str = "_snrs_uuid";

/// Identity bag cookie
pub const SNRS_P: &str = "_snrs_p";

/// Session bag cookie holding `ssuid`
pub const SNRS_SA: &str = "_snrs_sa";

/// JSON parameters cookie
pub const SNRS_PARAMS: &str = "_snrs_params";

/// Client parameters cookie
pub const SNRS_CL: &str = "_snrs_cl";

/// Bag field holding the visitor UUID
pub const FIELD_UUID: &str = "uuid";

/// Bag field holding the email hash
pub const FIELD_EMAIL_HASH: &str = "emailHash";

/// Session bag field holding the session-scoped id
pub const FIELD_SSUID: &str = "ssuid";

/// Visitor identity backed by cookies
pub struct IdentityStore {
    context: Arc<dyn RequestContext>,

    /// Cookie values seen or written during this request
    values: Mutex<HashMap<String, Option<String>>>,

    /// Resolved visitor UUID
    uuid: Mutex<Option<String>>,

    /// Serializes read-modify-write cycles on the identity bag
    bag_lock: Mutex<()>,
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("uuid", &*self.uuid.lock())
            .field("response_started", &self.context.is_response_started())
            .finish()
    }
}

impl IdentityStore {
    /// Create a store over the given request context
    pub fn new(context: Arc<dyn RequestContext>) -> Self {
        Self {
            context,
            values: Mutex::new(HashMap::new()),
            uuid: Mutex::new(None),
            bag_lock: Mutex::new(()),
        }
    }

    /// The request context this store reads from
    pub fn context(&self) -> &Arc<dyn RequestContext> {
        &self.context
    }

    /// Whether cookies can currently be written
    pub fn is_allowed_use(&self) -> bool {
        !self.context.is_response_started()
    }

    /// Raw cookie value, `None` when absent or empty
    ///
    /// The first lookup is cached; later writes through this store replace
    /// the cached value.
    pub fn cookie_string(&self, name: &str) -> Option<String> {
        let mut values = self.values.lock();
        values
            .entry(name.to_string())
            .or_insert_with(|| self.context.cookie(name))
            .clone()
            .filter(|v| !v.is_empty())
    }

    /// Decoded cookie value
    pub fn cookie(&self, name: &str) -> Option<Decoded> {
        self.cookie_string(name).map(|raw| codec::decode(&raw))
    }

    /// Write a cookie
    ///
    /// The local view is updated unconditionally so this request stays
    /// consistent. Returns whether the cookie reached the response; a refused
    /// write is logged, never raised.
    pub fn set_cookie(&self, name: &str, value: &str) -> bool {
        self.values
            .lock()
            .insert(name.to_string(), Some(value.to_string()));

        match self.persist(name, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "identity cookie not persisted");
                false
            }
        }
    }

    /// Write an identity bag as a cookie
    pub fn set_bag(&self, name: &str, bag: &IdentityBag) -> bool {
        self.set_cookie(name, &bag.encode())
    }

    fn persist(&self, name: &str, value: &str) -> Result<()> {
        if self.context.is_response_started() {
            return Err(IdentityError::response_started(name));
        }
        self.context.set_cookie(SetCookie::persistent(name, value));
        Ok(())
    }

    // =========================================================================
    // Visitor UUID
    // =========================================================================

    /// Visitor UUID, if one is stored
    ///
    /// Checks `_snrs_uuid` first, then a `uuid:` segment of `_snrs_p`. The
    /// result is cached for the lifetime of the store.
    pub fn get_uuid(&self) -> Option<String> {
        let mut cached = self.uuid.lock();
        if cached.is_none() {
            *cached = self.derive_uuid();
        }
        cached.clone()
    }

    fn derive_uuid(&self) -> Option<String> {
        self.cookie_string(SNRS_UUID).or_else(|| {
            self.cookie_string(SNRS_P).and_then(|raw| {
                codec::find_segment(&raw, FIELD_UUID)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
        })
    }

    /// Store the visitor UUID in both cookie locations
    ///
    /// Other bag fields are preserved. Returns whether both writes reached
    /// the response.
    pub fn set_uuid(&self, uuid: &str) -> bool {
        let persisted = self.persist_uuid(uuid);
        *self.uuid.lock() = Some(uuid.to_string());
        persisted
    }

    fn persist_uuid(&self, uuid: &str) -> bool {
        let bag_written = self.set_field(FIELD_UUID, uuid);
        let scalar_written = self.set_cookie(SNRS_UUID, uuid);
        bag_written && scalar_written
    }

    /// Stored visitor UUID, or a newly generated and persisted one
    pub fn get_or_create_uuid(&self) -> String {
        let mut cached = self.uuid.lock();
        if cached.is_none() {
            *cached = self.derive_uuid();
        }
        if let Some(uuid) = cached.as_ref() {
            return uuid.clone();
        }

        let uuid = generate_uuid();
        debug!(uuid = %uuid, "generated visitor uuid");
        self.persist_uuid(&uuid);
        *cached = Some(uuid.clone());
        uuid
    }

    // =========================================================================
    // Identity bag fields
    // =========================================================================

    /// Set one field of the identity bag, keeping the others
    pub fn set_field(&self, key: &str, value: &str) -> bool {
        let _guard = self.bag_lock.lock();
        let mut bag = self
            .cookie(SNRS_P)
            .map(Decoded::into_bag)
            .unwrap_or_default();
        bag.insert(key, value);
        self.set_bag(SNRS_P, &bag)
    }

    /// Read one field of the identity bag
    pub fn field(&self, key: &str) -> Option<String> {
        self.cookie(SNRS_P)
            .map(Decoded::into_bag)
            .and_then(|bag| bag.get(key).filter(|v| !v.is_empty()).map(str::to_string))
    }

    /// Email hash stored in the identity bag
    pub fn email_hash(&self) -> Option<String> {
        self.field(FIELD_EMAIL_HASH)
    }

    /// Store the email hash in the identity bag
    pub fn set_email_hash(&self, hash: &str) -> bool {
        self.set_field(FIELD_EMAIL_HASH, hash)
    }

    // =========================================================================
    // Auxiliary cookies
    // =========================================================================

    /// Session-scoped id from the `_snrs_sa` bag
    pub fn ssuid(&self) -> Option<String> {
        self.cookie_string(SNRS_SA).and_then(|raw| {
            codec::find_segment(&raw, FIELD_SSUID)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    /// Parameters decoded from the `_snrs_params` JSON cookie
    ///
    /// Missing, malformed or empty-ish values (`null`, `false`, `0`, `""`,
    /// `"0"`, `[]`) yield `None`.
    pub fn snr_params(&self) -> Option<Value> {
        let raw = self.cookie_string(SNRS_PARAMS)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if is_truthy(&value) => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "ignoring malformed _snrs_params cookie");
                None
            }
        }
    }

    /// Raw `_snrs_cl` value
    pub fn client_params(&self) -> Option<String> {
        self.cookie_string(SNRS_CL)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
