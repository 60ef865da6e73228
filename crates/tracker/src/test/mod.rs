//! Test transports
//!
//! In-process [`HttpTransport`](crate::HttpTransport) implementations for
//! exercising the tracker without a collector.
//!
//! # Transports
//!
//! - [`RecordingTransport`] - records every request, answers a fixed status
//! - [`FailingTransport`] - fails every request with a transport error
//!
//! # Example
//!
//! ```ignore
//! use snrs_tracker::test::RecordingTransport;
//!
//! let transport = Arc::new(RecordingTransport::new());
//! let tracker = TrackerClient::with_transport(config, ctx, transport.clone())?;
//! tracker.flush().await;
//! assert_eq!(transport.requests().len(), 1);
//! ```


pub use failing::FailingTransport;
pub use recording::RecordingTransport;
