//! Per-category message queues
//!
//! A producer enriches each message on the way in and holds it until the
//! tracker drains the queue during flush. Messages are kept in enqueue order
//! with no deduplication.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::enrich::Enricher;
use crate::error::Result;
use crate::message::{Category, Message};

/// Queue of enriched messages for one category
#[derive(Debug)]
pub struct Producer {
    category: Category,
    enricher: Arc<Enricher>,
    queue: Mutex<Vec<Message>>,
}

impl Producer {
    /// Create an empty producer
    pub fn new(category: Category, enricher: Arc<Enricher>) -> Self {
        Self {
            category,
            enricher,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Category this producer serves
    pub fn category(&self) -> Category {
        self.category
    }

    /// Enrich a message and append it
    ///
    /// A validation failure leaves the queue untouched.
    pub fn enqueue(&self, message: Message) -> Result<()> {
        let message = self.enricher.enrich(message)?;
        let mut queue = self.queue.lock();
        queue.push(message);
        trace!(category = %self.category, queued = queue.len(), "message enqueued");
        Ok(())
    }

    /// Discard all queued messages
    pub fn reset(&self) {
        self.queue.lock().clear();
    }

    /// Snapshot of the queue
    pub fn queue(&self) -> Vec<Message> {
        self.queue.lock().clone()
    }

    /// Queue wrapped under the category tag, e.g. `{"event": [...]}`
    pub fn tagged_queue(&self) -> Map<String, Value> {
        let items = self.queue().into_iter().map(Value::Object).collect();
        let mut tagged = Map::new();
        tagged.insert(self.category.as_str().to_string(), Value::Array(items));
        tagged
    }

    /// Take every queued message, leaving the queue empty
    pub fn drain(&self) -> Vec<Message> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "producer_test.rs"]
mod producer_test;
