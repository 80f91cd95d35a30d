//! Network transport used to perform real calls
//!
//! The recorder only needs "send this request, give me the response". Any
//! client can be plugged in by implementing [`Transport`].

mod client;

pub use client::HyperTransport;

use std::future::Future;
use std::sync::Arc;

use crate::interaction::{HttpRequest, HttpResponse};
use crate::Result;

/// Capability to perform a request against the real network
pub trait Transport: Send + Sync {
    /// Send `request` and return the fully buffered response
    ///
    /// The response must reference `request`. Failures should be reported as
    /// [`HartapeError::Transport`](crate::HartapeError::Transport).
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send {
        (**self).send(request)
    }
}
