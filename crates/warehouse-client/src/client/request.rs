//! Request description passed to the HTTP sender.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

/// Which base URL a request is sent to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// The main warehouse API.
    #[default]
    Api,
    /// The status API.
    Status,
}

/// A request against the warehouse API.
///
/// Path segments are percent-encoded when the URL is built; empty segments
/// and empty query values are dropped.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) target: Target,
    pub(crate) segments: Vec<String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            target: Target::Api,
            segments: Vec::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Send to the status API instead of the main API.
    pub fn on_status_api(mut self) -> Self {
        self.target = Target::Status;
        self
    }

    /// Append a path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        if !segment.is_empty() {
            self.segments.push(segment);
        }
        self
    }

    /// Append a path segment if present.
    pub fn segment_opt<S: Into<String>>(self, segment: Option<S>) -> Self {
        match segment {
            Some(s) => self.segment(s),
            None => self,
        }
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter if present.
    pub fn query_opt<S: Into<String>>(self, key: impl Into<String>, value: Option<S>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Add a header. An explicit `Authorization` header replaces the configured credentials.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path relative to the base URL, unencoded (for logs and errors).
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> Target {
        self.target
    }
}
