//! In-memory model of recorded HTTP interactions

pub mod headers;
mod http;
mod message;

pub use headers::Headers;
pub use http::{Body, HttpRequest, HttpResponse, HTTP_1_1};
pub use message::{Interaction, InteractionMessage, InteractionTimings};
