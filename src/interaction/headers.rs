//! Header list helpers
//!
//! Headers are kept as ordered `(name, value)` pairs. Names compare
//! case-insensitively, repeated headers stay as separate entries.

/// Ordered header list
pub type Headers = Vec<(String, String)>;

/// Headers that describe the body rather than the message
const ENTITY_HEADERS: &[&str] = &[
    "allow",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-length",
    "content-location",
    "content-md5",
    "content-range",
    "content-type",
    "expires",
    "last-modified",
];

/// Content-Length header name
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Content-Type header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// Check whether `name` is an entity header
#[must_use]
pub fn is_entity_header(name: &str) -> bool {
    ENTITY_HEADERS
        .iter()
        .any(|entity| entity.eq_ignore_ascii_case(name))
}

/// All values of `name`, in order
pub fn values<'a>(headers: &'a [(String, String)], name: &'a str) -> impl Iterator<Item = &'a str> {
    headers
        .iter()
        .filter(move |(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// First value of `name`
#[must_use]
pub fn first<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Replace every value of `name` with a single `value`
pub fn set(headers: &mut Headers, name: &str, value: impl Into<String>) {
    remove(headers, name);
    headers.push((name.to_string(), value.into()));
}

/// Remove every value of `name`
pub fn remove(headers: &mut Headers, name: &str) {
    headers.retain(|(header, _)| !header.eq_ignore_ascii_case(name));
}

/// Split a flat list into (message headers, entity headers)
#[must_use]
pub fn split_entity(headers: Headers) -> (Headers, Headers) {
    headers
        .into_iter()
        .partition(|(name, _)| !is_entity_header(name))
}
