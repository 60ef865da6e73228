//! End-of-request flush
//!
//! [`FlushGuard`] ties a flush to the end of a request scope. Call
//! [`FlushGuard::finish`] to flush and observe the outcome. A guard dropped
//! without `finish` spawns a best-effort flush on the current tokio runtime,
//! or logs and discards the queue when no runtime is available.

use std::ops::Deref;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::tracker::{SendOutcome, TrackerClient};

/// Flushes a tracker exactly once when the request scope ends
#[derive(Debug)]
pub struct FlushGuard {
    tracker: Arc<TrackerClient>,
    finished: bool,
}

impl FlushGuard {
    /// Guard a tracker
    pub fn new(tracker: Arc<TrackerClient>) -> Self {
        Self {
            tracker,
            finished: false,
        }
    }

    /// The guarded tracker
    pub fn tracker(&self) -> &Arc<TrackerClient> {
        &self.tracker
    }

    /// Flush now and disarm the guard
    pub async fn finish(mut self) -> SendOutcome {
        self.finished = true;
        self.tracker.flush().await
    }

    /// Disarm the guard without flushing
    ///
    /// Queued messages stay on the tracker.
    pub fn disarm(mut self) {
        self.finished = true;
    }
}

impl Deref for FlushGuard {
    type Target = TrackerClient;

    fn deref(&self) -> &TrackerClient {
        &self.tracker
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let tracker = Arc::clone(&self.tracker);
                handle.spawn(async move {
                    let outcome = tracker.flush().await;
                    debug!(?outcome, "flushed on guard drop");
                });
            }
            Err(_) => {
                let pending = self.tracker.pending();
                if pending > 0 {
                    warn!(pending, "no tokio runtime on guard drop, queued messages not sent");
                }
            }
        }
    }
}

impl TrackerClient {
    /// Guard this tracker so it is flushed when the request scope ends
    pub fn guard(self: &Arc<Self>) -> FlushGuard {
        FlushGuard::new(Arc::clone(self))
    }
}
