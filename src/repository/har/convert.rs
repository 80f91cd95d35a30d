//! Mapping between interactions and HAR documents

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hyper::Uri;

use super::format::{
    Content, Creator, Entry, HttpArchive, Log, NameValue, PostData, Request, Response, Timings,
    HAR_VERSION,
};
use crate::interaction::headers::{self, Headers};
use crate::interaction::{
    Body, HttpRequest, HttpResponse, Interaction, InteractionMessage, InteractionTimings, HTTP_1_1,
};
use crate::{HartapeError, Result};

const BASE64_ENCODING: &str = "base64";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Convert an interaction to an archive
#[must_use]
pub fn to_archive(interaction: &Interaction) -> HttpArchive {
    HttpArchive {
        log: Log {
            version: HAR_VERSION.to_string(),
            creator: Creator::default(),
            entries: interaction.messages.iter().map(to_entry).collect(),
        },
    }
}

/// Convert an archive back to an interaction named `name`
///
/// # Errors
///
/// Returns `RepositoryFailure` if an entry holds an invalid URL or body encoding
pub fn to_interaction(archive: &HttpArchive, name: &str) -> Result<Interaction> {
    let messages = archive
        .log
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            from_entry(entry)
                .map_err(|reason| HartapeError::repository(name, format!("entry {index}: {reason}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Interaction::with_messages(name, messages))
}

fn to_entry(message: &InteractionMessage) -> Entry {
    let time = message.timings.elapsed.as_micros() as f64 / 1000.0;

    Entry {
        started_date_time: message.timings.started_at.into(),
        time,
        request: to_request(message.request()),
        response: to_response(&message.response),
        cache: serde_json::json!({}),
        timings: Timings::waited(time),
    }
}

fn to_request(request: &HttpRequest) -> Request {
    Request {
        method: request.method.clone(),
        url: request.uri.to_string(),
        http_version: request.version.clone(),
        cookies: Vec::new(),
        headers: to_pairs(&request.all_headers()),
        query_string: request.uri.query().map(parse_pairs).unwrap_or_default(),
        post_data: request.body.as_ref().map(to_post_data),
        headers_size: -1,
        body_size: body_size(request.body.as_ref()),
    }
}

fn to_post_data(body: &Body) -> PostData {
    let mime_type = body.content_type().unwrap_or_default().to_string();

    match body.text() {
        Some(text) if is_form(&mime_type) && encode_form(&parse_pairs(text)) == text => PostData {
            mime_type,
            params: parse_pairs(text),
            text: None,
            encoding: None,
        },
        Some(text) => PostData {
            mime_type,
            params: Vec::new(),
            text: Some(text.to_string()),
            encoding: None,
        },
        None => PostData {
            mime_type,
            params: Vec::new(),
            text: Some(BASE64.encode(body.content())),
            encoding: Some(BASE64_ENCODING.to_string()),
        },
    }
}

fn to_response(response: &HttpResponse) -> Response {
    let content = match response.body.as_ref() {
        Some(body) => {
            let (text, encoding) = match body.text() {
                Some(text) => (text.to_string(), None),
                None => (
                    BASE64.encode(body.content()),
                    Some(BASE64_ENCODING.to_string()),
                ),
            };
            Content {
                size: body.len() as i64,
                mime_type: body.content_type().unwrap_or_default().to_string(),
                text: Some(text),
                encoding,
            }
        }
        None => Content {
            size: 0,
            ..Content::default()
        },
    };

    Response {
        status: response.status,
        status_text: response.status_text(),
        http_version: response.version.clone(),
        cookies: Vec::new(),
        headers: to_pairs(&response.all_headers()),
        content,
        redirect_url: response.header_value("Location").unwrap_or_default(),
        headers_size: -1,
        body_size: body_size(response.body.as_ref()),
    }
}

fn from_entry(entry: &Entry) -> std::result::Result<InteractionMessage, String> {
    let request = Arc::new(from_request(&entry.request)?);
    let response = from_response(&entry.response, request)?;

    // Saturating cast: negative or NaN times become zero.
    let elapsed = Duration::from_micros((entry.time.max(0.0) * 1000.0).round() as u64);

    Ok(InteractionMessage::new(
        response,
        InteractionTimings::new(entry.started_date_time.with_timezone(&Utc), elapsed),
    ))
}

fn from_request(request: &Request) -> std::result::Result<HttpRequest, String> {
    let uri = request
        .url
        .parse::<Uri>()
        .map_err(|e| format!("invalid request URL '{}': {e}", request.url))?;

    let body = match request.post_data.as_ref() {
        Some(post_data) if post_data.text.is_some() => Some(Body::new(decode_text(
            post_data.text.as_deref().unwrap_or_default(),
            post_data.encoding.as_deref(),
        )?)),
        Some(post_data) => Some(Body::new(encode_form(&post_data.params))),
        None => None,
    };

    let (headers, body) = attach_headers(from_pairs(&request.headers), body);

    Ok(HttpRequest {
        method: request.method.clone(),
        uri,
        version: version_or_default(&request.http_version),
        headers,
        body,
    })
}

fn from_response(
    response: &Response,
    request: Arc<HttpRequest>,
) -> std::result::Result<HttpResponse, String> {
    let body = match response.content.text.as_deref() {
        Some(text) => Some(Body::new(decode_text(
            text,
            response.content.encoding.as_deref(),
        )?)),
        None => None,
    };

    let (headers, body) = attach_headers(from_pairs(&response.headers), body);

    let mut out = HttpResponse::new(response.status, request);
    // Only keep reason phrases that differ from the canonical one.
    let canonical = out.status_text();
    out.reason = Some(response.status_text.clone())
        .filter(|text| !text.is_empty() && *text != canonical);
    out.version = version_or_default(&response.http_version);
    out.headers = headers;
    out.body = body;
    Ok(out)
}

/// Put entity headers on the body when there is one
fn attach_headers(headers: Headers, body: Option<Body>) -> (Headers, Option<Body>) {
    match body {
        Some(mut body) => {
            let (message, entity) = headers::split_entity(headers);
            body.headers = entity;
            (message, Some(body))
        }
        None => (headers, None),
    }
}

fn decode_text(text: &str, encoding: Option<&str>) -> std::result::Result<Vec<u8>, String> {
    match encoding {
        None => Ok(text.as_bytes().to_vec()),
        Some(encoding) if encoding.eq_ignore_ascii_case(BASE64_ENCODING) => BASE64
            .decode(text)
            .map_err(|e| format!("invalid base64 body: {e}")),
        Some(other) => Err(format!("unsupported body encoding '{other}'")),
    }
}

fn version_or_default(version: &str) -> String {
    if version.is_empty() {
        HTTP_1_1.to_string()
    } else {
        version.to_string()
    }
}

fn body_size(body: Option<&Body>) -> i64 {
    body.map_or(0, |body| body.len() as i64)
}

fn to_pairs(headers: &[(String, String)]) -> Vec<NameValue> {
    headers
        .iter()
        .map(|(name, value)| NameValue::new(name, value))
        .collect()
}

fn from_pairs(pairs: &[NameValue]) -> Headers {
    pairs
        .iter()
        .map(|pair| (pair.name.clone(), pair.value.clone()))
        .collect()
}

fn is_form(mime_type: &str) -> bool {
    mime_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

/// Parse `a=1&b=2` into decoded pairs
fn parse_pairs(encoded: &str) -> Vec<NameValue> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            NameValue::new(decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn encode_form(params: &[NameValue]) -> String {
    params
        .iter()
        .map(|param| {
            let name: Cow<'_, str> = urlencoding::encode(&param.name);
            let value: Cow<'_, str> = urlencoding::encode(&param.value);
            format!("{name}={value}")
        })
        .collect::<Vec<_>>()
        .join("&")
}
