//! Recorded exchanges and the interaction that groups them

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::http::{HttpRequest, HttpResponse};

/// When an exchange started and how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTimings {
    /// Wall-clock start of the request
    pub started_at: DateTime<Utc>,
    /// Time until the full response was received
    pub elapsed: Duration,
}

impl InteractionTimings {
    /// Create timings
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            started_at,
            elapsed,
        }
    }
}

/// One recorded request/response pair
///
/// The request is reached through the response's back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionMessage {
    /// Recorded response
    pub response: HttpResponse,
    /// Recorded timings
    pub timings: InteractionTimings,
}

impl InteractionMessage {
    /// Create a message
    #[must_use]
    pub fn new(response: HttpResponse, timings: InteractionTimings) -> Self {
        Self { response, timings }
    }

    /// Request that produced the response
    #[must_use]
    pub fn request(&self) -> &HttpRequest {
        self.response.request()
    }
}

/// Recorded fixture for one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Storage identifier, usually a file path
    pub name: String,
    /// Messages in the order the requests were observed
    pub messages: Vec<InteractionMessage>,
}

impl Interaction {
    /// Create an empty interaction
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }

    /// Create an interaction from existing messages
    pub fn with_messages(
        name: impl Into<String>,
        messages: impl IntoIterator<Item = InteractionMessage>,
    ) -> Self {
        Self {
            name: name.into(),
            messages: messages.into_iter().collect(),
        }
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no messages were recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
