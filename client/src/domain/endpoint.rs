//! Immutable descriptions of one REST call.
//!
//! An [`Endpoint`] names everything the [`ResourceClient`] needs to perform a
//! single exchange: method, path, query pairs, extra headers, an optional JSON
//! body, and the payload shape the caller expects back.
//!
//! [`ResourceClient`]: crate::domain::ResourceClient

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP verbs used by the rental pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a resource.
    Get,
    /// Create a resource or submit credentials.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Canonical upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload shape a successful response must have.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PayloadShape {
    /// Any well-formed JSON value.
    #[default]
    Any,
    /// A JSON array; element validation is left to the binder.
    Collection,
    /// A JSON object carrying every listed field.
    Record {
        /// Field names that must be present and non-null.
        required: Vec<String>,
    },
}

impl PayloadShape {
    /// Object shape requiring the given fields.
    pub fn record<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Record {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

/// One REST call, immutable once built.
///
/// ## Invariants
/// - `path` is absolute (starts with `/`).
/// - `lenient_json` defaults to `true`, enabling the single repair pass for
///   bodies wrapped in stray characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
    shape: PayloadShape,
    lenient_json: bool,
}

impl Endpoint {
    /// Start a `GET` descriptor.
    pub fn get(path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(Method::Get, path)
    }

    /// Start a `POST` descriptor.
    pub fn post(path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(Method::Post, path)
    }

    /// Start a `PUT` descriptor.
    pub fn put(path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(Method::Put, path)
    }

    /// Start a `DELETE` descriptor.
    pub fn delete(path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(Method::Delete, path)
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Query pairs in key order.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Extra request headers in key order.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// JSON body, when the call carries one.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Shape the successful payload must have.
    #[must_use]
    pub const fn shape(&self) -> &PayloadShape {
        &self.shape
    }

    /// Whether the bounded repair pass may run on an unparsable body.
    #[must_use]
    pub const fn lenient_json(&self) -> bool {
        self.lenient_json
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    endpoint: Endpoint,
}

impl EndpointBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let path = if raw.starts_with('/') {
            raw
        } else {
            format!("/{raw}")
        };
        Self {
            endpoint: Endpoint {
                method,
                path,
                query: BTreeMap::new(),
                headers: BTreeMap::new(),
                body: None,
                shape: PayloadShape::Any,
                lenient_json: true,
            },
        }
    }

    /// Add one query pair; a repeated key replaces the earlier value.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint.query.insert(key.into(), value.into());
        self
    }

    /// Add one request header; a repeated name replaces the earlier value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.endpoint.body = Some(body);
        self
    }

    /// Declare the payload shape a successful response must have.
    #[must_use]
    pub fn expect(mut self, shape: PayloadShape) -> Self {
        self.endpoint.shape = shape;
        self
    }

    /// Disable the bounded repair pass for this endpoint.
    #[must_use]
    pub fn strict_json(mut self) -> Self {
        self.endpoint.lenient_json = false;
        self
    }

    /// Freeze the descriptor.
    #[must_use]
    pub fn build(self) -> Endpoint {
        self.endpoint
    }
}
