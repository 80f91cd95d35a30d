//! Selection of recorded messages during replay
//!
//! A matcher receives the incoming request and the pool of messages that
//! have not been consumed yet. It returns at most one message and decides
//! whether that message leaves the pool.

mod rules;
mod uri;

pub use rules::{Rule, RulesMatcher, ValueComparison};
pub use uri::{truncate as truncate_uri, UriPart};

use serde::{Deserialize, Serialize};

use crate::interaction::{HttpRequest, InteractionMessage};

/// Whether a matched message stays available for later requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Remove a message from the pool once it matched
    #[default]
    Once,
    /// Leave matched messages in the pool
    Multiple,
}

/// Replay candidate selection
pub trait RequestMatcher: Send + Sync {
    /// Pick the message answering `request` from `pool`
    ///
    /// The pool is only borrowed for the duration of the call.
    fn find_match(
        &self,
        request: &HttpRequest,
        pool: &mut Vec<InteractionMessage>,
    ) -> Option<InteractionMessage>;
}

impl<F> RequestMatcher for F
where
    F: Fn(&HttpRequest, &mut Vec<InteractionMessage>) -> Option<InteractionMessage> + Send + Sync,
{
    fn find_match(
        &self,
        request: &HttpRequest,
        pool: &mut Vec<InteractionMessage>,
    ) -> Option<InteractionMessage> {
        self(request, pool)
    }
}
