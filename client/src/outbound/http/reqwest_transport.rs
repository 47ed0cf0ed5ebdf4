//! Reqwest-backed transport adapter.
//!
//! This adapter owns transport details only: method and header translation,
//! the optional client-wide timeout, and mapping reqwest failures onto
//! `TransportError`. Status classification stays in the resource client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::domain::Method;
use crate::domain::ports::{RawResponse, Transport, TransportError, TransportRequest};

const DEFAULT_USER_AGENT: &str = concat!("rental-sync/", env!("CARGO_PKG_VERSION"));

/// Transport that performs each exchange with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport, optionally bounding every exchange by `timeout`.
    ///
    /// Without a timeout the reqwest default (none) applies.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        let client = match timeout {
            Some(limit) => builder.timeout(limit).build()?,
            None => builder.build()?,
        };
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(map_transport_error)?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            content_type,
            body: body.to_vec(),
        })
    }
}

const fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::unreachable(error.to_string())
    } else {
        TransportError::aborted(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Method::Get, reqwest::Method::GET)]
    #[case(Method::Post, reqwest::Method::POST)]
    #[case(Method::Put, reqwest::Method::PUT)]
    #[case(Method::Delete, reqwest::Method::DELETE)]
    fn methods_translate_one_to_one(#[case] method: Method, #[case] expected: reqwest::Method) {
        assert_eq!(to_reqwest_method(method), expected);
    }

    #[test]
    fn builds_with_and_without_timeout() {
        assert!(ReqwestTransport::new(None).is_ok());
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
    }
}
