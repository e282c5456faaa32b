//! The parsed request handed to handlers.
//!
//! A [`Request`] is produced once per connection by
//! [`parse_request`](crate::codec::parse_request) and is never edited in
//! place. Routing derives a new value with [`Request::with_path`], moving the
//! body handle across.

use crate::protocol::body::ReqBody;
use crate::protocol::HeaderMap;

/// An HTTP request line plus headers, with a handle to the unread body.
#[derive(Debug)]
pub struct Request {
    method: String,
    path: String,
    headers: HeaderMap,
    body: ReqBody,
}

impl Request {
    /// Starts building a request. Parsing goes through the same builder.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Upper-cased request method, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target as sent, minus any prefix a router has stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Shortcut for `headers().get(name)`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &ReqBody {
        &self.body
    }

    /// The declared `content-length`, 0 when the header is absent or not a number.
    pub fn content_length(&self) -> u64 {
        content_length(&self.headers)
    }

    /// Whether the client asked for a `100 Continue` before sending its body.
    pub fn expects_continue(&self) -> bool {
        self.headers.get("expect").is_some_and(|value| value.contains("100-continue"))
    }

    /// Derives a new request targeting `path`, keeping everything else.
    pub fn with_path(self, path: impl Into<String>) -> Request {
        Request { path: path.into(), ..self }
    }

    pub fn into_parts(self) -> (String, String, HeaderMap, ReqBody) {
        (self.method, self.path, self.headers, self.body)
    }
}

pub(crate) fn content_length(headers: &HeaderMap) -> u64 {
    headers.get("content-length").and_then(|value| value.trim().parse::<u64>().ok()).unwrap_or(0)
}

#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    path: String,
    headers: HeaderMap,
    body: ReqBody,
}

impl RequestBuilder {
    fn new() -> Self {
        Self { method: "GET".into(), path: "/".into(), headers: HeaderMap::new(), body: ReqBody::empty() }
    }

    /// Sets the method, upper-casing it.
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        self.method = method.as_ref().to_ascii_uppercase();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a header, keeping earlier values under the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: ReqBody) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Request {
        Request { method: self.method, path: self.path, headers: self.headers, body: self.body }
    }
}
