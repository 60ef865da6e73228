//! HTTP transport seam
//!
//! The tracker never talks to the network directly. It builds an
//! [`HttpRequest`] and hands it to an [`HttpTransport`]; the default
//! implementation is [`ReqwestTransport`]. Tests substitute a recording
//! transport.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TransportError;

/// HTTP method used by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Batch delivery
    Post,
    /// Single-event delivery
    Put,
}

impl HttpMethod {
    /// Method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Build a request with a JSON body
    pub fn json<T: Serialize + ?Sized>(
        method: HttpMethod,
        url: impl Into<String>,
        headers: IndexMap<String, String>,
        body: &T,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let body =
            serde_json::to_vec(body).map_err(|e| TransportError::Serialization(e.to_string()))?;
        Ok(Self {
            method,
            url: url.into(),
            headers,
            body,
            timeout,
        })
    }
}

/// Response status and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the collector accepted the request
    ///
    /// Only 200 counts; other 2xx statuses are treated as failures.
    pub fn is_accepted(&self) -> bool {
        self.status == 200
    }
}

/// Sends tracker requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and wait for the response
    ///
    /// Implementations should honour `request.timeout`. Non-2xx statuses are
    /// responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder().build().unwrap_or_default(),
        }
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = match method {
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(e, timeout))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

fn map_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_request() {
        let mut headers = IndexMap::new();
        headers.insert("Api-Key".to_string(), "k".to_string());

        let req = HttpRequest::json(
            HttpMethod::Post,
            "http://localhost/batch",
            headers,
            &json!([{"a": 1}]),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(req.method.as_str(), "POST");
        assert_eq!(req.url, "http://localhost/batch");
        assert_eq!(req.body, br#"[{"a":1}]"#);
        assert_eq!(req.headers["Api-Key"], "k");
    }

    #[test]
    fn test_only_200_accepted() {
        assert!(HttpResponse::new(200, "").is_accepted());
        assert!(!HttpResponse::new(204, "").is_accepted());
        assert!(!HttpResponse::new(500, "oops").is_accepted());
    }
}
