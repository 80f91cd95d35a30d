//! Hartape - record and replay HTTP interactions for tests
//!
//! Wrap an HTTP client in an [`HttpRecorder`]: the first run records real
//! traffic into a HAR archive, later runs replay it without the network.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::field_reassign_with_default,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod interaction;
pub mod matching;
pub mod recorder;
pub mod repository;
pub mod transport;

pub use config::{Mode, RecorderConfig};
pub use error::{HartapeError, Result};
pub use interaction::{Body, HttpRequest, HttpResponse, Interaction, InteractionMessage};
pub use matching::{Cardinality, RequestMatcher, RulesMatcher, UriPart};
pub use recorder::HttpRecorder;
pub use repository::{HarRepository, InteractionRepository, MemoryRepository};
pub use transport::{HyperTransport, Transport};
