//! snrs visitor identity
//!
//! Recovers and persists a stable anonymous visitor identity across
//! requests, using browser cookies as the storage medium.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   cookie()/header()    ┌──────────────────┐
//! │ RequestContext │◀───────────────────────│  IdentityStore   │
//! │ (host adapter) │────────────────────────▶ (per request)    │
//! └────────────────┘   set_cookie()         └──────────────────┘
//!                                                   │
//!                                                   ▼
//!                                           ┌──────────────────┐
//!                                           │ codec            │
//!                                           │ key:v&key:v bags │
//!                                           └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use snrs_identity::{IdentityStore, MemoryContext, SNRS_UUID};
//!
//! let ctx = Arc::new(MemoryContext::new().with_cookie(SNRS_UUID, "abc-123"));
//! let store = IdentityStore::new(ctx);
//!
//! assert_eq!(store.get_uuid().as_deref(), Some("abc-123"));
//! store.set_email_hash("9e107d9d372bb6826bd81d3542a419d6");
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod store;
pub mod visitor_id;

pub use codec::{Decoded, IdentityBag, decode, encode};
pub use context::{MAX_COOKIE_EXPIRY, MemoryContext, RequestContext, SetCookie};
pub use error::{IdentityError, Result};
pub use store::{
    FIELD_EMAIL_HASH, FIELD_SSUID, FIELD_UUID, IdentityStore, SNRS_CL, SNRS_P, SNRS_PARAMS,
    SNRS_SA, SNRS_UUID,
};
pub use visitor_id::generate_uuid;
