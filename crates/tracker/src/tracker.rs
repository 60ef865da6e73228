//! Tracker client
//!
//! Composition root for one request scope: one identity store, one enricher
//! and exactly one producer per [`Category`]. Queued messages leave in a
//! single batched POST on [`TrackerClient::flush`]; [`TrackerClient::send_event`]
//! bypasses the queues with an immediate PUT.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use snrs_config::{Config, TrackerConfig};
use snrs_identity::{IdentityStore, RequestContext};
use tracing::{debug, trace, warn};

use crate::enrich::{ClientIdentity, Enricher, is_blank};
use crate::error::{Result, TransportError};
use crate::message::{Category, KEY_UUID, Message, MessageBuilder};
use crate::producer::Producer;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Action sent by [`TrackerClient::form_submit`]
pub const ACTION_FORM_SUBMIT: &str = "form.submit";

/// Default category for [`TrackerClient::form_submit`]
pub const CATEGORY_CONTACT_FORM: &str = "client.web.browser.contact";

/// Action queued by [`TrackerClient::page_visit`]
pub const ACTION_PAGE_VISIT: &str = "page.visit";

/// Category queued by [`TrackerClient::page_visit`]
pub const CATEGORY_BROWSER: &str = "client.web.browser";

/// Action queued by [`TrackerClient::purchase`]
pub const ACTION_TRANSACTION_CHARGE: &str = "transaction.charge";

/// Result of a flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was queued, no request made
    Skipped,
    /// Collector answered 200
    Sent {
        /// Messages in the batch
        count: usize,
    },
    /// Collector answered with another status
    Rejected {
        /// Messages in the batch
        count: usize,
        /// HTTP status
        status: u16,
    },
    /// Request never completed
    Failed {
        /// Messages in the batch
        count: usize,
        /// Transport failure
        error: TransportError,
    },
}

impl SendOutcome {
    /// Whether the flush counts as a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Skipped | Self::Sent { .. })
    }
}

/// Event tracker for one request scope
pub struct TrackerClient {
    config: TrackerConfig,
    headers: IndexMap<String, String>,
    transport: Arc<dyn HttpTransport>,
    enricher: Arc<Enricher>,
    client: Producer,
    event: Producer,
    transaction: Producer,

    /// Serializes flushes
    flush_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for TrackerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerClient")
            .field("batch_url", &self.config.batch_url)
            .field("transport", &self.transport.name())
            .field("pending", &self.pending())
            .finish()
    }
}

impl TrackerClient {
    /// Create a tracker using the reqwest transport
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(config: TrackerConfig, context: Arc<dyn RequestContext>) -> Result<Self> {
        Self::with_transport(config, context, Arc::new(ReqwestTransport::new()))
    }

    /// Create a tracker from a loaded configuration file
    pub fn from_config(config: &Config, context: Arc<dyn RequestContext>) -> Result<Self> {
        Self::new(config.tracker.clone(), context)
    }

    /// Create a tracker with a custom transport
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn with_transport(
        config: TrackerConfig,
        context: Arc<dyn RequestContext>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let config = Config::from_tracker(config)?.tracker;
        let store = Arc::new(IdentityStore::new(context));
        let enricher = Arc::new(Enricher::new(store));

        Ok(Self {
            headers: config.headers(),
            config,
            transport,
            client: Producer::new(Category::Client, Arc::clone(&enricher)),
            event: Producer::new(Category::Event, Arc::clone(&enricher)),
            transaction: Producer::new(Category::Transaction, Arc::clone(&enricher)),
            enricher,
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Visitor identity for this request
    pub fn identity(&self) -> &IdentityStore {
        self.enricher.store()
    }

    // =========================================================================
    // Producers
    // =========================================================================

    /// Producer for a category
    pub fn producer(&self, category: Category) -> &Producer {
        match category {
            Category::Client => &self.client,
            Category::Event => &self.event,
            Category::Transaction => &self.transaction,
        }
    }

    /// Total queued messages across all producers
    pub fn pending(&self) -> usize {
        Category::FLUSH_ORDER
            .iter()
            .map(|c| self.producer(*c).len())
            .sum()
    }

    /// Snapshot of the next batch, in send order
    pub fn batch(&self) -> Vec<Message> {
        Category::FLUSH_ORDER
            .iter()
            .flat_map(|c| self.producer(*c).queue())
            .collect()
    }

    /// Enrich and queue a message
    ///
    /// # Errors
    ///
    /// Returns a validation error if `params.time` is not a timestamp; the
    /// message is not queued.
    pub fn enqueue(&self, category: Category, message: Message) -> Result<()> {
        self.producer(category).enqueue(message)
    }

    /// Queue a behavioural event
    pub fn track_event(
        &self,
        action: impl Into<String>,
        category: impl Into<String>,
        label: impl Into<String>,
        params: Message,
    ) -> Result<()> {
        let message = MessageBuilder::new()
            .action(action)
            .category(category)
            .label(label)
            .params(params)
            .build();
        self.enqueue(Category::Event, message)
    }

    /// Queue a page visit
    pub fn page_visit(
        &self,
        label: impl Into<String>,
        url: impl Into<String>,
        params: Message,
    ) -> Result<()> {
        let url: String = url.into();
        let message = MessageBuilder::new()
            .action(ACTION_PAGE_VISIT)
            .category(CATEGORY_BROWSER)
            .label(label)
            .param("url", url)
            .params(params)
            .build();
        self.enqueue(Category::Event, message)
    }

    /// Queue a transaction
    pub fn purchase(&self, label: impl Into<String>, params: Message) -> Result<()> {
        let message = MessageBuilder::new()
            .action(ACTION_TRANSACTION_CHARGE)
            .label(label)
            .params(params)
            .build();
        self.enqueue(Category::Transaction, message)
    }

    /// Queue a profile update
    ///
    /// `fields` become top-level keys of the message (`firstname`, `city`...).
    pub fn update_profile(&self, fields: Message) -> Result<()> {
        self.enqueue(Category::Client, fields)
    }

    // =========================================================================
    // Client identity
    // =========================================================================

    /// Attach a host-assigned customer id to every later message
    pub fn identify(&self, custom_id: impl Into<String>) {
        let custom_id = custom_id.into();
        self.enricher
            .update_client_identity(|c| c.custom_id = Some(custom_id));
    }

    /// Attach a customer email to every later message
    pub fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.enricher.update_client_identity(|c| c.email = Some(email));
    }

    /// Override the visitor UUID on every later message
    ///
    /// Cookies are left alone; use [`IdentityStore::set_uuid`] to persist.
    pub fn set_uuid(&self, uuid: impl Into<String>) {
        let uuid = uuid.into();
        self.enricher.update_client_identity(|c| c.uuid = Some(uuid));
    }

    /// Current explicit client identity
    pub fn client_identity(&self) -> ClientIdentity {
        self.enricher.client_identity()
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Clear every queue without sending
    pub fn flush_queue(&self) {
        for category in Category::FLUSH_ORDER {
            self.producer(category).reset();
        }
    }

    /// Clear every queue and forget the explicit client identity
    pub fn flush_instances(&self) {
        self.flush_queue();
        self.enricher.clear_client_identity();
    }

    /// Send every queued message in one batch
    ///
    /// Queues are emptied whether or not delivery succeeds. Failures are
    /// logged and reported in the outcome, never raised.
    pub async fn flush(&self) -> SendOutcome {
        let _in_flight = self.flush_lock.lock().await;

        let batch: Vec<Message> = Category::FLUSH_ORDER
            .iter()
            .flat_map(|c| self.producer(*c).drain())
            .collect();
        let count = batch.len();
        if count == 0 {
            trace!("nothing to flush");
            return SendOutcome::Skipped;
        }

        let request = match HttpRequest::json(
            HttpMethod::Post,
            self.config.batch_url.as_str(),
            self.headers.clone(),
            &batch,
            self.config.batch_timeout,
        ) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, count, "failed to encode batch");
                return SendOutcome::Failed { count, error };
            }
        };

        match self.dispatch(request).await {
            Ok(response) if response.is_accepted() => {
                debug!(count, "batch sent");
                SendOutcome::Sent { count }
            }
            Ok(response) => {
                warn!(
                    status = response.status,
                    body = %String::from_utf8_lossy(&response.body),
                    count,
                    "batch rejected"
                );
                SendOutcome::Rejected {
                    count,
                    status: response.status,
                }
            }
            Err(error) => {
                warn!(error = %error, count, "batch send failed");
                SendOutcome::Failed { count, error }
            }
        }
    }

    /// Send one event immediately, bypassing the queues
    ///
    /// The visitor UUID is added to `params` when absent, null or empty.
    /// Returns whether the collector answered 200.
    pub async fn send_event(
        &self,
        action: &str,
        category: &str,
        label: &str,
        mut params: Message,
    ) -> bool {
        if is_blank(params.get(KEY_UUID)) {
            let uuid = self
                .enricher
                .client_identity()
                .uuid
                .unwrap_or_else(|| self.identity().get_or_create_uuid());
            params.insert(KEY_UUID.to_string(), Value::String(uuid));
        }

        let mut payload = Message::new();
        payload.insert("label".to_string(), Value::from(label));
        payload.insert("params".to_string(), Value::Object(params));
        payload.insert("action".to_string(), Value::from(action));
        payload.insert("category".to_string(), Value::from(category));

        let request = match HttpRequest::json(
            HttpMethod::Put,
            self.config.event_url(),
            self.headers.clone(),
            &payload,
            self.config.event_timeout,
        ) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, action, "failed to encode event");
                return false;
            }
        };

        match self.dispatch(request).await {
            Ok(response) if response.is_accepted() => {
                debug!(action, category, "event sent");
                true
            }
            Ok(response) => {
                warn!(status = response.status, action, "event rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, action, "event send failed");
                false
            }
        }
    }

    /// Send a form submission immediately
    ///
    /// `category` defaults to [`CATEGORY_CONTACT_FORM`].
    pub async fn form_submit(&self, label: &str, params: Message, category: Option<&str>) -> bool {
        self.send_event(
            ACTION_FORM_SUBMIT,
            category.unwrap_or(CATEGORY_CONTACT_FORM),
            label,
            params,
        )
        .await
    }

    /// Send through the transport, bounded by the request timeout
    async fn dispatch(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let timeout = request.timeout;
        trace!(
            method = request.method.as_str(),
            url = %request.url,
            bytes = request.body.len(),
            transport = self.transport.name(),
            "sending request"
        );
        tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tracker_test;
