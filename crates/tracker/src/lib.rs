//! snrs tracker
//!
//! Builds tracking events, enriches them with the visitor identity and
//! request metadata, queues them per category and ships them to the
//! collector in one batch at the end of the request.
//!
//! # Architecture
//!
//! ```text
//!  track_event / page_visit / purchase / update_profile
//!                        │
//!                        ▼
//!  ┌────────────┐   ┌──────────┐   ┌──────────────────────────────┐
//!  │ Enricher   │◀──│ Producer │──▶│ queue (event|transaction|    │
//!  │ + identity │   │ enqueue  │   │        client)               │
//!  └────────────┘   └──────────┘   └──────────────────────────────┘
//!                                                  │ flush()
//!                                                  ▼
//!                                   ┌──────────────────────────────┐
//!                                   │ HttpTransport  POST batch    │
//!                                   └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use snrs_config::TrackerConfig;
//! use snrs_identity::MemoryContext;
//! use snrs_tracker::{MessageBuilder, TrackerClient};
//!
//! # async fn run() -> snrs_tracker::Result<()> {
//! let ctx = Arc::new(MemoryContext::new().with_remote_addr("203.0.113.9"));
//! let tracker = Arc::new(TrackerClient::new(TrackerConfig::new("api-key"), ctx)?);
//! let guard = tracker.guard();
//!
//! guard.page_visit("Home", "https://shop.example/", Default::default())?;
//! guard.enqueue(
//!     snrs_tracker::Category::Event,
//!     MessageBuilder::new().action("cart.add").label("Sneakers").build(),
//! )?;
//!
//! let outcome = guard.finish().await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod error;
pub mod guard;
pub mod logging;
pub mod message;
pub mod producer;
pub mod test;
pub mod tracker;
pub mod transport;

pub use enrich::{ClientIdentity, Enricher, UNKNOWN_IP};
pub use error::{Result, TrackerError, TransportError};
pub use guard::FlushGuard;
pub use message::{Category, Message, MessageBuilder};
pub use producer::Producer;
pub use tracker::{
    ACTION_FORM_SUBMIT, ACTION_PAGE_VISIT, ACTION_TRANSACTION_CHARGE, CATEGORY_BROWSER,
    CATEGORY_CONTACT_FORM, SendOutcome, TrackerClient,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
