//! Live message adapters

use bytes::Bytes;
use indexmap::IndexMap;

use super::{Message, Request, Response};

/// Multi-valued headers in insertion order
///
/// Adding a name that is already present appends to its value list, so
/// repeated headers such as `Set-Cookie` are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, Vec<String>>,
}

impl Headers {
    /// Create an empty header set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(value.into());
    }

    /// Raw values for `name` (ASCII case-insensitive), in the order added
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Joined value for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let values = self.values(name);
        (!values.is_empty()).then(|| values.join(", "))
    }

    /// Remove every value stored under `name`
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|key, _| !key.eq_ignore_ascii_case(name));
    }

    /// Number of distinct header names
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no headers are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened view, values joined with `", "`
    #[must_use]
    pub fn flatten(&self) -> IndexMap<String, String> {
        self.entries
            .iter()
            .map(|(name, values)| (name.clone(), values.join(", ")))
            .collect()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

/// A live HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicRequest {
    /// HTTP method
    pub method: String,
    /// Request URI
    pub uri: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: Bytes,
}

impl BasicRequest {
    /// Create a request without headers or body
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl Message for BasicRequest {
    fn headers(&self) -> IndexMap<String, String> {
        self.headers.flatten()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name)
    }

    fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    fn body_as_binary(&self) -> Bytes {
        self.body.clone()
    }
}

impl Request for BasicRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn uri(&self) -> &str {
        &self.uri
    }
}

/// A live HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl BasicResponse {
    /// Create a response without headers or body
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl Message for BasicResponse {
    fn headers(&self) -> IndexMap<String, String> {
        self.headers.flatten()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name)
    }

    fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    fn body_as_binary(&self) -> Bytes {
        self.body.clone()
    }
}

impl Response for BasicResponse {
    fn status(&self) -> u16 {
        self.status
    }
}
