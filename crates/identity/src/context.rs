//! Request context seam
//!
//! The tracker never touches a web framework directly. A host adapts its
//! request/response pair to [`RequestContext`]: cookie and header lookups,
//! the peer address, whether the response has started, and a sink for
//! `Set-Cookie` values.
//!
//! [`MemoryContext`] is a ready-made implementation for hosts that copy the
//! relevant request parts up front, and for tests.

use std::collections::HashMap;
use std::fmt;

use chrono::DateTime;
use parking_lot::Mutex;

/// Expiry used for every identity cookie: the largest 32-bit epoch second
pub const MAX_COOKIE_EXPIRY: i64 = 2_147_483_647;

/// Access to the inbound request and the outgoing response headers
pub trait RequestContext: Send + Sync {
    /// Cookie value sent by the browser, already URL-decoded
    fn cookie(&self, name: &str) -> Option<String>;

    /// Request header value; lookups must be case-insensitive
    fn header(&self, name: &str) -> Option<String>;

    /// Address of the connected peer
    fn remote_addr(&self) -> Option<String>;

    /// Whether response headers have already been sent
    fn is_response_started(&self) -> bool;

    /// Queue a `Set-Cookie` on the response
    ///
    /// Only called while [`is_response_started`](Self::is_response_started)
    /// reports `false`.
    fn set_cookie(&self, cookie: SetCookie);
}

/// A cookie to be set on the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// Expiry as epoch seconds
    pub expires: i64,
    pub path: String,
}

impl SetCookie {
    /// Create a persistent root-path cookie with the maximal expiry
    pub fn persistent(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: MAX_COOKIE_EXPIRY,
            path: "/".to_string(),
        }
    }

    /// Render the `Set-Cookie` header value
    ///
    /// The value is percent-encoded so the bag separators survive transport.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, encode_cookie_value(&self.value));
        if let Some(expires) = DateTime::from_timestamp(self.expires, 0) {
            out.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        out.push_str(&format!("; Path={}", self.path));
        out
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]`
fn encode_cookie_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// In-memory request context
///
/// Header names are matched case-insensitively. Cookies written through
/// [`RequestContext::set_cookie`] are recorded and can be rendered with
/// [`set_cookie_headers`](Self::set_cookie_headers).
#[derive(Debug, Default)]
pub struct MemoryContext {
    cookies: HashMap<String, String>,
    headers: HashMap<String, String>,
    remote_addr: Option<String>,
    response_started: Mutex<bool>,
    written: Mutex<Vec<SetCookie>>,
}

impl MemoryContext {
    /// Create an empty context: no cookies, no headers, response not started
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inbound cookie
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Add an inbound header
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the peer address
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Mark the response as started (or not)
    pub fn set_response_started(&self, started: bool) {
        *self.response_started.lock() = started;
    }

    /// Cookies written so far, in write order
    pub fn written_cookies(&self) -> Vec<SetCookie> {
        self.written.lock().clone()
    }

    /// Last value written for a cookie
    pub fn written_value(&self, name: &str) -> Option<String> {
        self.written
            .lock()
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    /// Rendered `Set-Cookie` header values, in write order
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.written
            .lock()
            .iter()
            .map(SetCookie::to_header_value)
            .collect()
    }
}

impl RequestContext for MemoryContext {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    fn remote_addr(&self) -> Option<String> {
        self.remote_addr.clone()
    }

    fn is_response_started(&self) -> bool {
        *self.response_started.lock()
    }

    fn set_cookie(&self, cookie: SetCookie) {
        self.written.lock().push(cookie);
    }
}
