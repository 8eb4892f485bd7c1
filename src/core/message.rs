//! Neutral request and response value types.
//!
//! These types are independent of any transport engine: adapters translate
//! the engine's native objects into this model on the way in and back out on
//! the way out. All fields are plain value data; everything beyond
//! construction and accessors lives at the adapter boundary.

use std::fmt;

use crate::core::{Body, Headers, Method};

/// Scheme of the requested URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request provenance: where the request came from and over what scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSource {
    /// Client address, as reported by the peer socket
    pub host: String,
    /// Client port
    pub port: u16,
    /// Scheme of the requested URI
    pub scheme: Scheme,
}

impl RequestSource {
    pub fn new(host: impl Into<String>, port: u16, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            port,
            scheme,
        }
    }
}

/// A neutral HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    target: String,
    headers: Headers,
    body: Body,
    source: RequestSource,
}

impl Request {
    /// Build a request with an empty body and placeholder provenance.
    ///
    /// Transport adapters overwrite the provenance with real connection
    /// metadata; handlers constructed in tests can leave the placeholder.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: Headers::new(),
            body: Body::empty(),
            source: RequestSource::new("", 0, Scheme::Http),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_source(mut self, source: RequestSource) -> Self {
        self.source = source;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path plus `?query` when a non-blank query is present
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Path component of the target
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    /// Query component of the target, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn source(&self) -> &RequestSource {
        &self.source
    }
}

/// A neutral HTTP response.
#[derive(Debug)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Build a response with the canonical reason phrase and an empty body
    pub fn new(status: u16) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Split into headers and body, keeping status and reason
    pub fn into_parts(self) -> (u16, String, Headers, Body) {
        (self.status, self.reason, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_splits_into_path_and_query() {
        let request = Request::new(Method::Get, "/search?q=http4k");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query(), Some("q=http4k"));
        assert_eq!(request.target(), "/search?q=http4k");
    }

    #[test]
    fn bare_path_has_no_query() {
        let request = Request::new(Method::Get, "/search");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query(), None);
    }

    #[test]
    fn response_defaults_to_canonical_reason() {
        assert_eq!(Response::new(404).reason(), "Not Found");
        assert_eq!(Response::new(500).reason(), "Internal Server Error");
        // unassigned codes carry an empty reason
        assert_eq!(Response::new(599).reason(), "");
    }

    #[test]
    fn reason_can_be_overridden() {
        let response = Response::new(404).with_reason("nope");
        assert_eq!(response.reason(), "nope");
    }

    #[test]
    fn builders_accumulate_headers() {
        let response = Response::ok()
            .with_header("X-A", "1")
            .with_header("X-A", "2");
        let values: Vec<_> = response.headers().get_all("x-a").collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn request_body_round_trips() {
        let request = Request::new(Method::Post, "/upload").with_body("hello");
        assert_eq!(request.body().length(), Some(5));
        assert_eq!(&request.into_body().collect().await.unwrap()[..], b"hello");
    }
}
