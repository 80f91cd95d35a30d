//! HTTP request/response model shared by the recorder, matcher and codec

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use hyper::Uri;

use super::headers::{self, Headers, CONTENT_LENGTH, CONTENT_TYPE};
use crate::{HartapeError, Result};

/// Default protocol version recorded for messages
pub const HTTP_1_1: &str = "HTTP/1.1";

/// Buffered message body and the entity headers describing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    /// Entity headers (`Content-Type`, `Content-Length`, ...)
    pub headers: Headers,
    content: Bytes,
}

impl Body {
    /// Create a body with no entity headers
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            headers: Vec::new(),
            content: content.into(),
        }
    }

    /// Create a body with a `Content-Type`
    pub fn with_content_type(content: impl Into<Bytes>, content_type: &str) -> Self {
        let mut body = Self::new(content);
        body.headers
            .push((CONTENT_TYPE.to_string(), content_type.to_string()));
        body
    }

    /// Body bytes
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Body length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the body is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Fresh reader positioned at the start of the body
    ///
    /// Every call is independent of previous reads.
    #[must_use]
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.content.clone())
    }

    /// Body as UTF-8 text, if valid
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Value of the `Content-Type` entity header
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        headers::first(&self.headers, CONTENT_TYPE)
    }

    /// Value of the `Content-Length` entity header
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        headers::first(&self.headers, CONTENT_LENGTH).and_then(|value| value.trim().parse().ok())
    }

    /// Force `Content-Length` to the buffered length
    pub fn fix_content_length(&mut self) {
        let length = self.content.len().to_string();
        headers::set(&mut self.headers, CONTENT_LENGTH, length);
    }
}

/// Outbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method, compared case-sensitively
    pub method: String,
    /// Absolute request URI
    pub uri: Uri,
    /// Protocol version, e.g. `HTTP/1.1`
    pub version: String,
    /// Message headers (entity headers live on the body)
    pub headers: Headers,
    /// Optional body
    pub body: Option<Body>,
}

impl HttpRequest {
    /// Create a request without headers or body
    ///
    /// # Errors
    ///
    /// Returns error if `uri` is not a valid absolute URI
    pub fn new(method: impl Into<String>, uri: &str) -> Result<Self> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| HartapeError::InvalidRequest(format!("Invalid URI '{uri}': {e}")))?;

        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(HartapeError::InvalidRequest(format!(
                "URI must be absolute: {uri}"
            )));
        }

        Ok(Self {
            method: method.into(),
            uri,
            version: HTTP_1_1.to_string(),
            headers: Vec::new(),
            body: None,
        })
    }

    /// `GET` request
    ///
    /// # Errors
    ///
    /// Returns error if `uri` is not a valid absolute URI
    pub fn get(uri: &str) -> Result<Self> {
        Self::new("GET", uri)
    }

    /// `POST` request with a body
    ///
    /// # Errors
    ///
    /// Returns error if `uri` is not a valid absolute URI
    pub fn post(uri: &str, body: Body) -> Result<Self> {
        Ok(Self::new("POST", uri)?.with_body(body))
    }

    /// Add a header; entity headers are attached to the body when one exists
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self.body.as_mut() {
            Some(body) if headers::is_entity_header(name) => {
                body.headers.push((name.to_string(), value.to_string()));
            }
            _ => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Comma-joined values of `name` from both message and body headers
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<String> {
        joined_header(&self.headers, self.body.as_ref(), name)
    }

    /// Message and body headers as one flat list
    #[must_use]
    pub fn all_headers(&self) -> Headers {
        flatten(&self.headers, self.body.as_ref())
    }
}

/// HTTP response carrying a reference to the request that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase as received
    pub reason: Option<String>,
    /// Protocol version, e.g. `HTTP/1.1`
    pub version: String,
    /// Message headers (entity headers live on the body)
    pub headers: Headers,
    /// Optional body
    pub body: Option<Body>,
    request: Arc<HttpRequest>,
}

impl HttpResponse {
    /// Create an empty response to `request`
    pub fn new(status: u16, request: impl Into<Arc<HttpRequest>>) -> Self {
        Self {
            status,
            reason: None,
            version: HTTP_1_1.to_string(),
            headers: Vec::new(),
            body: None,
            request: request.into(),
        }
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header; entity headers are attached to the body when one exists
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self.body.as_mut() {
            Some(body) if headers::is_entity_header(name) => {
                body.headers.push((name.to_string(), value.to_string()));
            }
            _ => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// The request that produced this response
    #[must_use]
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Shared handle to the originating request
    #[must_use]
    pub fn request_handle(&self) -> Arc<HttpRequest> {
        Arc::clone(&self.request)
    }

    /// Reason phrase, falling back to the canonical one for the status
    #[must_use]
    pub fn status_text(&self) -> String {
        self.reason.clone().unwrap_or_else(|| {
            hyper::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or_default()
                .to_string()
        })
    }

    /// Comma-joined values of `name` from both message and body headers
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<String> {
        joined_header(&self.headers, self.body.as_ref(), name)
    }

    /// Message and body headers as one flat list
    #[must_use]
    pub fn all_headers(&self) -> Headers {
        flatten(&self.headers, self.body.as_ref())
    }

    /// Make the response safe to hand to the caller
    ///
    /// The body is already buffered; its `Content-Length` is forced to the
    /// buffered size and any copy of the header outside the body is dropped.
    #[must_use]
    pub fn into_buffered(mut self) -> Self {
        if let Some(body) = self.body.as_mut() {
            body.fix_content_length();
            headers::remove(&mut self.headers, CONTENT_LENGTH);
        }
        self
    }
}

fn joined_header(message: &[(String, String)], body: Option<&Body>, name: &str) -> Option<String> {
    let body_headers = body
        .map(|body| body.headers.as_slice())
        .unwrap_or_default();
    let values: Vec<&str> = headers::values(message, name)
        .chain(headers::values(body_headers, name))
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

fn flatten(message: &[(String, String)], body: Option<&Body>) -> Headers {
    let mut all = message.to_vec();
    if let Some(body) = body {
        all.extend(body.headers.iter().cloned());
    }
    all
}
