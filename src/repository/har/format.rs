//! HTTP Archive (HAR 1.2) document model
//!
//! Only the parts needed to round-trip an interaction are modelled. Cookies,
//! cache and header sizes are written as placeholders and ignored on read.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// HAR format version written to `log.version`
pub const HAR_VERSION: &str = "1.2";

/// Root of a HAR document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpArchive {
    /// The log
    pub log: Log,
}

/// Archive log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Tool that produced the archive
    #[serde(default)]
    pub creator: Creator,
    /// Recorded entries in request order
    #[serde(default)]
    pub entries: Vec<Entry>,
}

fn default_version() -> String {
    HAR_VERSION.to_string()
}

/// Producer of the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    /// Tool name
    pub name: String,
    /// Tool version
    pub version: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Request start
    pub started_date_time: DateTime<FixedOffset>,
    /// Elapsed time in milliseconds
    pub time: f64,
    /// Request block
    pub request: Request,
    /// Response block
    pub response: Response,
    /// Cache info, always empty
    #[serde(default)]
    pub cache: serde_json::Value,
    /// Phase timings
    #[serde(default)]
    pub timings: Timings,
}

/// Request block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Method
    pub method: String,
    /// Absolute URL
    pub url: String,
    /// Protocol version
    #[serde(default)]
    pub http_version: String,
    /// Cookies, always empty
    #[serde(default)]
    pub cookies: Vec<serde_json::Value>,
    /// Headers, repeated headers as separate entries
    #[serde(default)]
    pub headers: Vec<NameValue>,
    /// Query parameters mirrored from the URL
    #[serde(default)]
    pub query_string: Vec<NameValue>,
    /// Body, when present
    #[serde(default)]
    pub post_data: Option<PostData>,
    /// Always -1
    #[serde(default = "unknown_size")]
    pub headers_size: i64,
    /// Body size in bytes
    #[serde(default = "unknown_size")]
    pub body_size: i64,
}

/// Response block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Reason phrase
    #[serde(default)]
    pub status_text: String,
    /// Protocol version
    #[serde(default)]
    pub http_version: String,
    /// Cookies, always empty
    #[serde(default)]
    pub cookies: Vec<serde_json::Value>,
    /// Headers, repeated headers as separate entries
    #[serde(default)]
    pub headers: Vec<NameValue>,
    /// Body description
    #[serde(default)]
    pub content: Content,
    /// `Location` target, empty when not a redirect
    #[serde(rename = "redirectURL", default)]
    pub redirect_url: String,
    /// Always -1
    #[serde(default = "unknown_size")]
    pub headers_size: i64,
    /// Body size in bytes
    #[serde(default = "unknown_size")]
    pub body_size: i64,
}

fn unknown_size() -> i64 {
    -1
}

/// Name/value pair used for headers, query and form parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    /// Name
    pub name: String,
    /// Value
    pub value: String,
}

impl NameValue {
    /// Create a pair
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    /// Body MIME type
    #[serde(default)]
    pub mime_type: String,
    /// Form parameters, for url-encoded forms
    #[serde(default)]
    pub params: Vec<NameValue>,
    /// Raw body text
    #[serde(default)]
    pub text: Option<String>,
    /// `base64` when `text` is encoded
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Body size in bytes, -1 if unknown
    pub size: i64,
    /// Body MIME type, empty if unknown
    #[serde(default)]
    pub mime_type: String,
    /// Body text, possibly encoded
    #[serde(default)]
    pub text: Option<String>,
    /// `base64` when `text` is encoded
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Default for Content {
    fn default() -> Self {
        Self {
            size: -1,
            mime_type: String::new(),
            text: None,
            encoding: None,
        }
    }
}

/// Phase timings in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Time to send the request
    pub send: f64,
    /// Time waiting for the response
    pub wait: f64,
    /// Time to read the response
    pub receive: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            send: 0.0,
            wait: -1.0,
            receive: 0.0,
        }
    }
}

impl Timings {
    /// Attribute the whole elapsed time to waiting
    #[must_use]
    pub fn waited(milliseconds: f64) -> Self {
        Self {
            send: 0.0,
            wait: milliseconds,
            receive: 0.0,
        }
    }
}
