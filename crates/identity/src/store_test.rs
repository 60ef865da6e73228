//! Tests for IdentityStore

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::*;
use crate::context::MemoryContext;

fn store_with(ctx: MemoryContext) -> (IdentityStore, Arc<MemoryContext>) {
    let ctx = Arc::new(ctx);
    (IdentityStore::new(ctx.clone()), ctx)
}

/// Context that counts cookie lookups
struct CountingContext {
    inner: MemoryContext,
    reads: AtomicUsize,
}

impl RequestContext for CountingContext {
    fn cookie(&self, name: &str) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.cookie(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.inner.header(name)
    }

    fn remote_addr(&self) -> Option<String> {
        self.inner.remote_addr()
    }

    fn is_response_started(&self) -> bool {
        self.inner.is_response_started()
    }

    fn set_cookie(&self, cookie: SetCookie) {
        self.inner.set_cookie(cookie)
    }
}

// =============================================================================
// UUID lookup
// =============================================================================

#[test]
fn test_get_uuid_prefers_dedicated_cookie() {
    let (store, _) = store_with(
        MemoryContext::new()
            .with_cookie(SNRS_UUID, "from-scalar")
            .with_cookie(SNRS_P, "uuid:from-bag&emailHash:h"),
    );
    assert_eq!(store.get_uuid().as_deref(), Some("from-scalar"));
}

#[test]
fn test_get_uuid_falls_back_to_bag() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_P, "emailHash:h&uuid:u-7"));
    assert_eq!(store.get_uuid().as_deref(), Some("u-7"));
}

#[test]
fn test_get_uuid_from_single_segment_bag() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_P, "uuid:only"));
    assert_eq!(store.get_uuid().as_deref(), Some("only"));
}

#[test]
fn test_get_uuid_none() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_P, "emailHash:h&x:y"));
    assert_eq!(store.get_uuid(), None);
}

#[test]
fn test_empty_uuid_cookie_ignored() {
    let (store, _) = store_with(
        MemoryContext::new()
            .with_cookie(SNRS_UUID, "")
            .with_cookie(SNRS_P, "uuid:u1&a:b"),
    );
    assert_eq!(store.get_uuid().as_deref(), Some("u1"));
}

#[test]
fn test_get_uuid_is_cached() {
    let ctx = Arc::new(CountingContext {
        inner: MemoryContext::new().with_cookie(SNRS_UUID, "abc-123"),
        reads: AtomicUsize::new(0),
    });
    let store = IdentityStore::new(ctx.clone());

    let first = store.get_uuid();
    let reads_after_first = ctx.reads.load(Ordering::SeqCst);
    let second = store.get_uuid();

    assert_eq!(first.as_deref(), Some("abc-123"));
    assert_eq!(first, second);
    assert_eq!(ctx.reads.load(Ordering::SeqCst), reads_after_first);
    assert!(ctx.inner.written_cookies().is_empty());
}

// =============================================================================
// UUID writes
// =============================================================================

#[test]
fn test_set_uuid_writes_both_locations() {
    let (store, ctx) = store_with(MemoryContext::new());
    assert!(store.set_uuid("u1"));

    assert_eq!(ctx.written_value(SNRS_UUID).as_deref(), Some("u1"));
    assert_eq!(ctx.written_value(SNRS_P).as_deref(), Some("uuid:u1"));
    assert_eq!(store.get_uuid().as_deref(), Some("u1"));
}

#[test]
fn test_set_uuid_merges_into_bag() {
    let (store, ctx) = store_with(MemoryContext::new().with_cookie(SNRS_P, "emailHash:h&uuid:old"));
    store.set_uuid("new");
    assert_eq!(
        ctx.written_value(SNRS_P).as_deref(),
        Some("emailHash:h&uuid:new")
    );
}

#[test]
fn test_set_field_after_set_uuid_keeps_uuid() {
    let (store, ctx) = store_with(MemoryContext::new());
    store.set_uuid("u1");
    store.set_field("emailHash", "x");

    let bag = codec::decode(&ctx.written_value(SNRS_P).unwrap());
    let bag = bag.as_bag().expect("two fields decode as a bag");
    assert_eq!(bag.get("uuid"), Some("u1"));
    assert_eq!(bag.get("emailHash"), Some("x"));
    assert_eq!(store.field("uuid").as_deref(), Some("u1"));
}

#[test]
fn test_set_field_over_opaque_scalar_starts_fresh() {
    let (store, ctx) = store_with(MemoryContext::new().with_cookie(SNRS_P, "not-a-bag"));
    store.set_field("emailHash", "x");
    assert_eq!(ctx.written_value(SNRS_P).as_deref(), Some("emailHash:x"));
}

#[test]
fn test_email_hash_roundtrip() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_P, "uuid:u&a:b"));
    assert_eq!(store.email_hash(), None);
    assert!(store.set_email_hash("9e107d9d"));
    assert_eq!(store.email_hash().as_deref(), Some("9e107d9d"));
    assert_eq!(store.field("uuid").as_deref(), Some("u"));
}

#[test]
fn test_get_or_create_reuses_existing() {
    let (store, ctx) = store_with(MemoryContext::new().with_cookie(SNRS_P, "uuid:kept&a:b"));
    assert_eq!(store.get_or_create_uuid(), "kept");
    assert!(ctx.written_cookies().is_empty());
}

#[test]
fn test_get_or_create_generates_once() {
    let (store, ctx) = store_with(MemoryContext::new());

    let first = store.get_or_create_uuid();
    let second = store.get_or_create_uuid();

    assert_eq!(first, second);
    assert_eq!(first.len(), 36);
    assert_eq!(ctx.written_value(SNRS_UUID), Some(first.clone()));
    assert_eq!(ctx.written_value(SNRS_P), Some(format!("uuid:{first}")));
    // one bag write + one scalar write
    assert_eq!(ctx.written_cookies().len(), 2);
}

// =============================================================================
// Response already started
// =============================================================================

#[test]
fn test_write_after_response_started_is_noop() {
    let (store, ctx) = store_with(MemoryContext::new());
    ctx.set_response_started(true);

    assert!(!store.is_allowed_use());
    assert!(!store.set_uuid("late"));
    assert!(ctx.written_cookies().is_empty());
    // local view still consistent for the rest of the request
    assert_eq!(store.get_uuid().as_deref(), Some("late"));
}

#[test]
fn test_generated_uuid_stable_when_writes_refused() {
    let (store, ctx) = store_with(MemoryContext::new());
    ctx.set_response_started(true);

    let first = store.get_or_create_uuid();
    assert_eq!(store.get_or_create_uuid(), first);
    assert!(ctx.written_cookies().is_empty());
}

// =============================================================================
// Auxiliary cookies
// =============================================================================

#[test]
fn test_ssuid() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_SA, "x:1&ssuid:s-42"));
    assert_eq!(store.ssuid().as_deref(), Some("s-42"));

    let (store, _) = store_with(MemoryContext::new());
    assert_eq!(store.ssuid(), None);
}

#[test]
fn test_snr_params_valid_json() {
    let (store, _) = store_with(
        MemoryContext::new().with_cookie(SNRS_PARAMS, r#"{"source":"newsletter","n":2}"#),
    );
    assert_eq!(
        store.snr_params(),
        Some(json!({"source": "newsletter", "n": 2}))
    );
}

#[test]
fn test_snr_params_invalid_or_falsy() {
    for raw in ["{not json", "null", "false", "0", "\"\"", "[]"] {
        let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_PARAMS, raw));
        assert_eq!(store.snr_params(), None, "expected None for {raw}");
    }
}

#[test]
fn test_client_params() {
    let (store, _) = store_with(MemoryContext::new().with_cookie(SNRS_CL, "cl-1"));
    assert_eq!(store.client_params().as_deref(), Some("cl-1"));
}
