//! One network exchange per call, classified into a [`FetchOutcome`].
//!
//! The client owns the response contract only: status class, JSON body, and
//! payload shape. Rendering decisions belong to the view binder.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::domain::ports::{RawResponse, Transport, TransportRequest};
use crate::domain::{Endpoint, ErrorKind, FetchOutcome, PayloadShape};

const SERVER_MESSAGE_KEYS: [&str; 2] = ["message", "error"];

/// Performs resource calls against one backend origin.
#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl ResourceClient {
    /// Build a client that resolves endpoint paths against `base_url`.
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// Origin endpoint paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform the exchange described by `endpoint` exactly once.
    ///
    /// Never retries and never fails: every result, including transport
    /// errors, is expressed as a [`FetchOutcome`].
    pub async fn call(&self, endpoint: &Endpoint) -> FetchOutcome {
        let outcome = match build_request(&self.base_url, endpoint) {
            Ok(request) => match self.transport.send(&request).await {
                Ok(response) => classify(endpoint, &response),
                Err(error) => FetchOutcome::failure(ErrorKind::Transport, error.to_string(), None),
            },
            Err(message) => FetchOutcome::failure(ErrorKind::Transport, message, None),
        };
        log_outcome(endpoint, &outcome);
        outcome
    }
}

fn build_request(base_url: &Url, endpoint: &Endpoint) -> Result<TransportRequest, String> {
    let mut url = join_path(base_url, endpoint.path())
        .map_err(|error| format!("invalid request URL for '{}': {error}", endpoint.path()))?;
    if !endpoint.query().is_empty() {
        url.query_pairs_mut().extend_pairs(endpoint.query().iter());
    }

    let mut headers = endpoint.headers().clone();
    let body = match endpoint.body() {
        Some(value) => {
            if !headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"))
            {
                headers.insert("Content-Type".to_owned(), "application/json".to_owned());
            }
            let encoded = serde_json::to_vec(value)
                .map_err(|error| format!("request body could not be encoded: {error}"))?;
            Some(encoded)
        }
        None => None,
    };

    Ok(TransportRequest {
        method: endpoint.method(),
        url,
        headers,
        body,
    })
}

/// Resolve `path` beneath the base URL, keeping any mount prefix the base
/// carries.
fn join_path(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let mounted = format!("{}/", base.path());
        base.set_path(&mounted);
    }
    base.join(path.trim_start_matches('/'))
}

fn classify(endpoint: &Endpoint, response: &RawResponse) -> FetchOutcome {
    let status = response.status;
    if !(200..=299).contains(&status) {
        return FetchOutcome::failure(
            ErrorKind::HttpError,
            http_error_message(response),
            Some(status),
        );
    }

    let payload = match parse_body(&response.body, endpoint.lenient_json()) {
        Ok(payload) => payload,
        Err(error) => {
            return FetchOutcome::failure(
                ErrorKind::SchemaMismatch,
                unparsable_message(&error, response.content_type.as_deref()),
                Some(status),
            );
        }
    };

    match check_shape(endpoint.shape(), &payload) {
        Ok(()) => FetchOutcome::success(status, payload),
        Err(message) => FetchOutcome::failure(ErrorKind::SchemaMismatch, message, Some(status)),
    }
}

/// Parse a 2xx body, allowing one bounded repair pass when `lenient`.
///
/// A blank body parses as `null` so bodiless acknowledgements (for example
/// `204 No Content`) still count as success.
fn parse_body(body: &[u8], lenient: bool) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(body) {
        Ok(payload) => Ok(payload),
        Err(error) if lenient => match repair_json_body(body) {
            Some(trimmed) => {
                debug!("applying bounded JSON repair pass");
                serde_json::from_str(trimmed).map_err(|_| error)
            }
            None => Err(error),
        },
        Err(error) => Err(error),
    }
}

/// Trim everything before the first `{` and after the last `}`.
///
/// Runs once; the caller never feeds the result back in.
fn repair_json_body(body: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(body).ok()?;
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

fn http_error_message(response: &RawResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| server_message(&body))
        .unwrap_or_else(|| status_phrase(response))
}

/// Server-supplied `message` or `error` text carried by a JSON body.
fn server_message(body: &Value) -> Option<String> {
    SERVER_MESSAGE_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

fn status_phrase(response: &RawResponse) -> String {
    let phrase = response.status_text.trim();
    if phrase.is_empty() {
        format!("HTTP status {}", response.status)
    } else {
        phrase.to_owned()
    }
}

fn unparsable_message(error: &serde_json::Error, content_type: Option<&str>) -> String {
    match content_type {
        Some(declared) if !declared.to_ascii_lowercase().contains("json") => {
            format!("expected a JSON body but the server sent '{declared}': {error}")
        }
        _ => format!("response body is not valid JSON: {error}"),
    }
}

fn check_shape(shape: &PayloadShape, payload: &Value) -> Result<(), String> {
    match shape {
        PayloadShape::Any => Ok(()),
        PayloadShape::Collection if payload.is_array() => Ok(()),
        PayloadShape::Collection => Err(format!(
            "expected a JSON array, found {}",
            describe(payload)
        )),
        PayloadShape::Record { required } => {
            let Some(object) = payload.as_object() else {
                return Err(format!(
                    "expected a JSON object, found {}",
                    describe(payload)
                ));
            };
            let missing: Vec<&str> = required
                .iter()
                .map(String::as_str)
                .filter(|field| object.get(*field).is_none_or(Value::is_null))
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(server_message(payload).unwrap_or_else(|| {
                    format!("response is missing required field(s): {}", missing.join(", "))
                }))
            }
        }
    }
}

const fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn log_outcome(endpoint: &Endpoint, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Success { status, .. } => debug!(
            method = %endpoint.method(),
            path = endpoint.path(),
            status,
            "resource call succeeded"
        ),
        FetchOutcome::Failure {
            kind,
            message,
            status,
        } => debug!(
            method = %endpoint.method(),
            path = endpoint.path(),
            ?kind,
            ?status,
            %message,
            "resource call failed"
        ),
    }
}
