//! Driven port for the single network exchange behind every page.
//!
//! The domain owns the request and response shapes so the resource client
//! stays adapter-agnostic; the reqwest adapter and test fixtures both speak
//! these types.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use super::define_port_error;
use crate::domain::Method;

/// Fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Serialised body bytes, if any.
    pub body: Option<Vec<u8>>,
}

/// Raw response as observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// Numeric HTTP status.
    pub status: u16,
    /// Reason phrase for the status, possibly empty.
    pub status_text: String,
    /// Declared `Content-Type`, if the server sent one.
    pub content_type: Option<String>,
    /// Body bytes exactly as received.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response with a JSON content type.
    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            content_type: Some("application/json".to_owned()),
            body: body.into(),
        }
    }

    /// Override the reason phrase.
    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Override the declared content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_owned);
        self
    }
}

define_port_error! {
    /// Errors surfaced before any HTTP response was received.
    pub enum TransportError {
        /// Connection refused, DNS failure, or similar.
        Unreachable { message: String } =>
            "server unreachable: {message}",
        /// The exchange exceeded the transport's own deadline.
        Timeout { message: String } =>
            "request timed out: {message}",
        /// The exchange started but was abandoned mid-flight.
        Aborted { message: String } =>
            "request aborted: {message}",
    }
}

/// Port performing one HTTP exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once and return whatever the server answered.
    ///
    /// Any HTTP status counts as a response; only failures to obtain one are
    /// errors.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use rental_sync::domain::ports::{FixtureTransport, RawResponse, Transport};
    ///
    /// let transport = FixtureTransport::responding(RawResponse::json(200, "[]"));
    /// let response = transport.send(&request).await?;
    /// assert_eq!(response.status, 200);
    /// ```
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Fixture transport replaying one canned result and recording requests.
#[derive(Debug)]
pub struct FixtureTransport {
    reply: Result<RawResponse, TransportError>,
    sent: Mutex<Vec<TransportRequest>>,
}

impl FixtureTransport {
    /// Answer every request with `response`.
    #[must_use]
    pub fn responding(response: RawResponse) -> Self {
        Self {
            reply: Ok(response),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with `error`.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            reply: Err(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Requests observed so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
        self.reply.clone()
    }
}
