//! URI truncation for coarse matching

use hyper::Uri;
use serde::{Deserialize, Serialize};

/// How much of a request URI takes part in matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriPart {
    /// Scheme, host and port
    Authority,
    /// Scheme, host, port and path
    Path,
    /// The whole URI, query included
    #[default]
    Full,
}

/// Render the part of `uri` selected by `part`
///
/// Scheme and host are lowercased so `HTTP://Example.com` and
/// `http://example.com` compare equal.
#[must_use]
pub fn truncate(uri: &Uri, part: UriPart) -> String {
    let mut out = String::new();

    if let Some(scheme) = uri.scheme_str() {
        out.push_str(&scheme.to_ascii_lowercase());
        out.push_str("://");
    }

    if let Some(authority) = uri.authority() {
        out.push_str(&authority.host().to_ascii_lowercase());
        if let Some(port) = authority.port_u16() {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    if part == UriPart::Authority {
        return out;
    }

    out.push_str(uri.path());

    if part == UriPart::Full {
        if let Some(query) = uri.query() {
            out.push('?');
            out.push_str(query);
        }
    }

    out
}
