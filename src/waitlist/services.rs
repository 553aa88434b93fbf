use anyhow::Context;
use axum::{
    body::Body,
    extract::FromRequest,
    http::{header, HeaderMap, HeaderName, Method, Request},
    Form,
};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::waitlist::{dto::SignupRequest, repo_types::SignupRecord};

pub const MAX_HEADER_CHARS: usize = 500;
pub const MAX_UTM_CHARS: usize = 200;
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Loose `local@domain.tld` shape check. Deliberately not RFC 5322.
pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Originating client of an `x-forwarded-for` chain, or `""`.
pub fn first_forwarded_ip(headers: &HeaderMap) -> String {
    let xff = header_text(headers, HeaderName::from_static("x-forwarded-for"));
    xff.split(',').next().unwrap_or_default().trim().to_string()
}

pub fn hash_ip(ip: &str) -> Option<String> {
    if ip.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(ip.as_bytes())))
}

fn utm(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| truncate_chars(v, MAX_UTM_CHARS))
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Assembles the row for an already validated email.
pub fn build_record(email: String, payload: &SignupRequest, headers: &HeaderMap) -> SignupRecord {
    let referrer = header_text(headers, header::REFERER);
    let user_agent = header_text(headers, header::USER_AGENT);

    SignupRecord {
        email,
        referrer: truncate_chars(&referrer, MAX_HEADER_CHARS).to_string(),
        user_agent: truncate_chars(&user_agent, MAX_HEADER_CHARS).to_string(),
        utm_source: utm(&payload.utm_source),
        utm_medium: utm(&payload.utm_medium),
        utm_campaign: utm(&payload.utm_campaign),
        utm_term: utm(&payload.utm_term),
        utm_content: utm(&payload.utm_content),
        ip_hash: hash_ip(&first_forwarded_ip(headers)),
    }
}

enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let content_type = header_text(headers, header::CONTENT_TYPE).to_ascii_lowercase();
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}

/// Decodes the request body into a [`SignupRequest`].
///
/// Empty bodies and unrecognised content types give an empty payload; a body
/// that claims JSON or form encoding but does not decode is an error.
pub async fn read_payload(headers: &HeaderMap, body: Body) -> anyhow::Result<SignupRequest> {
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .context("read request body")?;
    if bytes.is_empty() {
        return Ok(SignupRequest::default());
    }

    match body_kind(headers) {
        BodyKind::Json => serde_json::from_slice(&bytes).context("decode json body"),
        BodyKind::Form => {
            let req = Request::builder()
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(bytes))
                .context("rebuild form request")?;
            let Form(payload) = Form::<SignupRequest>::from_request(req, &())
                .await
                .context("decode form body")?;
            Ok(payload)
        }
        BodyKind::Other => Ok(SignupRequest::default()),
    }
}
