//! hyper-based transport

use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::ext::ReasonPhrase;
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use super::Transport;
use crate::interaction::headers::{self, Headers};
use crate::interaction::{Body, HttpRequest, HttpResponse};
use crate::{HartapeError, Result};

/// Pooled HTTP/1 client
///
/// Plain `http` only; plug in another [`Transport`] for TLS.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a new client
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build_http();

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let wire_request = build_request(&request)?;
        let request = Arc::new(request);

        debug!("Sending {} {}", request.method, request.uri);

        let response = self.client.request(wire_request).await.map_err(|e| {
            warn!("Request failed: {e}");
            HartapeError::transport(e)
        })?;

        let status = response.status();
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
            .filter(|reason| Some(reason.as_str()) != status.canonical_reason());
        let version = format!("{:?}", response.version());
        let response_headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let content = response
            .into_body()
            .collect()
            .await
            .map_err(HartapeError::transport)?
            .to_bytes();

        let has_entity = response_headers
            .iter()
            .any(|(name, _)| headers::is_entity_header(name));

        let (message_headers, body) = if content.is_empty() && !has_entity {
            (response_headers, None)
        } else {
            let (message, entity) = headers::split_entity(response_headers);
            let mut body = Body::new(content);
            body.headers = entity;
            (message, Some(body))
        };

        let mut out = HttpResponse::new(status.as_u16(), request);
        out.reason = reason;
        out.version = version;
        out.headers = message_headers;
        out.body = body;
        Ok(out)
    }
}

/// Build the wire request
fn build_request(request: &HttpRequest) -> Result<Request<Full<Bytes>>> {
    let method = request.method.parse::<Method>().map_err(|e| {
        HartapeError::InvalidRequest(format!("Invalid HTTP method '{}': {e}", request.method))
    })?;

    let mut builder = Request::builder().method(method).uri(request.uri.clone());

    for (name, value) in request.all_headers() {
        builder = builder.header(name, value);
    }

    let content = request
        .body
        .as_ref()
        .map(|body| body.content().clone())
        .unwrap_or_default();

    builder
        .body(Full::new(content))
        .map_err(|e| HartapeError::InvalidRequest(format!("Failed to build request: {e}")))
}
