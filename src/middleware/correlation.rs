//! Correlation-id propagation.
//!
//! Every request leaving the server carries an `X-Correlation-Id`. The id is
//! taken from the inbound request when the caller supplied one, or generated
//! (UUID v4) and written onto the request otherwise, so downstream handlers
//! always see it. On the way out the same id is written onto the response and
//! listed in `Access-Control-Expose-Headers` so browser clients can read it
//! in cross-origin contexts.
//!
//! The header logic is split into two plain functions over
//! [`http::HeaderMap`], independent of any server framework: [`resolve`] for
//! the request side and [`synchronize`] for the response side.
//! [`correlation_id`] wires them around the next stage of an axum middleware
//! stack:
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use api_template::middleware::correlation::correlation_id;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(middleware::from_fn(correlation_id));
//! ```

use std::fmt;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::header::ACCESS_CONTROL_EXPOSE_HEADERS;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::Instrument;
use uuid::Uuid;

/// Canonical spelling of the correlation header. This is the entry written
/// into `Access-Control-Expose-Headers`.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// [`CORRELATION_ID_HEADER`] as a typed header name, for map lookups.
pub static CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// The correlation id of one request/response exchange.
///
/// Wraps the raw [`HeaderValue`] so a caller-supplied id is echoed back
/// byte-for-byte, even when it is not valid UTF-8. Inserted into the request
/// extensions by [`correlation_id`]; handlers can read it with
/// `Extension<CorrelationId>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(HeaderValue);

impl CorrelationId {
    /// A fresh id, formatted as a hyphenated UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        let mut buf = Uuid::encode_buffer();
        let id = Uuid::new_v4().hyphenated().encode_lower(&mut buf);
        // Lowercase hex digits and hyphens only.
        Self(HeaderValue::from_str(id).expect("hyphenated UUID is a valid header value"))
    }

    /// The id as text, or `None` if the caller sent non-visible-ASCII bytes.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.to_str().ok()
    }

    #[must_use]
    pub const fn as_header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl From<HeaderValue> for CorrelationId {
    fn from(value: HeaderValue) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0.as_bytes()))
    }
}

/// Determine the correlation id for an inbound request.
///
/// If the request already carries the header, its first value is returned
/// and the request is left untouched (extra values stay where they are).
/// Otherwise a new id is generated and inserted into `headers`.
pub fn resolve(headers: &mut HeaderMap) -> CorrelationId {
    if let Some(existing) = headers.get(&CORRELATION_ID) {
        let id = CorrelationId(existing.clone());
        tracing::debug!(correlation_id = %id, "reusing caller correlation id");
        return id;
    }

    let id = CorrelationId::generate();
    headers.insert(CORRELATION_ID.clone(), id.0.clone());
    tracing::debug!(correlation_id = %id, "generated correlation id");
    id
}

/// Apply a resolved correlation id to outgoing response headers.
///
/// The id becomes the sole value of the correlation header, replacing
/// anything a downstream stage wrote, and the header name is merged into
/// `Access-Control-Expose-Headers`.
pub fn synchronize(id: &CorrelationId, headers: &mut HeaderMap) {
    headers.insert(CORRELATION_ID.clone(), id.0.clone());
    expose_header(headers, CORRELATION_ID_HEADER);
}

/// Add `name` to `Access-Control-Expose-Headers` unless it is already listed.
///
/// Entries are matched case-sensitively across every value of the header,
/// with comma-joined values split into their individual entries. Matching is
/// done on raw bytes, so a value carrying non-UTF-8 entries is still
/// searched. When the
/// name is missing it is appended as a new value after the existing ones;
/// when present, the header is left exactly as it was.
pub fn expose_header(headers: &mut HeaderMap, name: &'static str) {
    let listed = headers
        .get_all(ACCESS_CONTROL_EXPOSE_HEADERS)
        .iter()
        .flat_map(|value| value.as_bytes().split(|b| *b == b','))
        .any(|entry| entry.trim_ascii() == name.as_bytes());

    if !listed {
        headers.append(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(name));
    }
}

/// Axum middleware that resolves the correlation id before the next stage
/// and synchronizes the response after it.
///
/// The downstream future runs inside a `request` span carrying
/// `correlation_id`, so every log line emitted while handling the request is
/// tagged with it.
pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let id = resolve(req.headers_mut());
    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!("request", correlation_id = %id);
    let mut response = next.run(req).instrument(span).await;

    synchronize(&id, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exposed(headers: &HeaderMap) -> Vec<&str> {
        headers
            .get_all(ACCESS_CONTROL_EXPOSE_HEADERS)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[test]
    fn generated_ids_are_distinct_uuids() {
        let a = CorrelationId::generate();
        let b = CorrelationId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str().unwrap()).is_ok());
    }

    #[test]
    fn resolve_generates_and_inserts_when_missing() {
        let mut headers = HeaderMap::new();
        let id = resolve(&mut headers);

        let values: Vec<_> = headers.get_all(&CORRELATION_ID).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], id.as_header_value());
        assert!(!values[0].is_empty());
    }

    #[test]
    fn resolve_reuses_existing_value_without_mutation() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID.clone(), "abc-123".parse().unwrap());
        let before = headers.clone();

        let id = resolve(&mut headers);

        assert_eq!(id.as_str(), Some("abc-123"));
        assert_eq!(headers, before);
    }

    #[test]
    fn resolve_matches_header_name_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-CORRELATION-ID").unwrap(),
            "upper".parse().unwrap(),
        );

        assert_eq!(resolve(&mut headers).as_str(), Some("upper"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn resolve_uses_first_of_multiple_values() {
        let mut headers = HeaderMap::new();
        headers.append(CORRELATION_ID.clone(), "first".parse().unwrap());
        headers.append(CORRELATION_ID.clone(), "second".parse().unwrap());

        let id = resolve(&mut headers);

        assert_eq!(id.as_str(), Some("first"));
        assert_eq!(headers.get_all(&CORRELATION_ID).iter().count(), 2);
    }

    #[test]
    fn resolve_keeps_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID.clone(), HeaderValue::from_static(""));

        let id = resolve(&mut headers);

        assert_eq!(id.as_str(), Some(""));
        assert_eq!(headers.get(&CORRELATION_ID).unwrap(), "");
    }

    #[test]
    fn resolve_preserves_opaque_bytes() {
        let raw = HeaderValue::from_bytes(b"id-\xfe").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID.clone(), raw.clone());

        let id = resolve(&mut headers);

        assert_eq!(id.as_header_value(), &raw);
        assert_eq!(id.as_str(), None);
    }

    #[test]
    fn synchronize_overwrites_downstream_value() {
        let id = CorrelationId::from(HeaderValue::from_static("resolved"));
        let mut headers = HeaderMap::new();
        headers.append(CORRELATION_ID.clone(), "stale".parse().unwrap());
        headers.append(CORRELATION_ID.clone(), "other".parse().unwrap());

        synchronize(&id, &mut headers);

        let values: Vec<_> = headers.get_all(&CORRELATION_ID).iter().collect();
        assert_eq!(values, vec!["resolved"]);
        assert_eq!(exposed(&headers), vec![CORRELATION_ID_HEADER]);
    }

    #[test]
    fn expose_creates_missing_declaration() {
        let mut headers = HeaderMap::new();
        expose_header(&mut headers, CORRELATION_ID_HEADER);
        assert_eq!(exposed(&headers), vec!["X-Correlation-Id"]);
    }

    #[test]
    fn expose_appends_after_existing_entries() {
        let mut headers = HeaderMap::new();
        headers.append(ACCESS_CONTROL_EXPOSE_HEADERS, "b".parse().unwrap());
        headers.append(ACCESS_CONTROL_EXPOSE_HEADERS, "a".parse().unwrap());

        expose_header(&mut headers, CORRELATION_ID_HEADER);

        assert_eq!(exposed(&headers), vec!["b", "a", "X-Correlation-Id"]);
    }

    #[test]
    fn expose_is_idempotent() {
        let mut headers = HeaderMap::new();
        expose_header(&mut headers, CORRELATION_ID_HEADER);
        expose_header(&mut headers, CORRELATION_ID_HEADER);
        assert_eq!(exposed(&headers), vec!["X-Correlation-Id"]);
    }

    #[test]
    fn expose_finds_entry_inside_comma_joined_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            "ETag, X-Correlation-Id ,Link".parse().unwrap(),
        );

        expose_header(&mut headers, CORRELATION_ID_HEADER);

        assert_eq!(exposed(&headers), vec!["ETag, X-Correlation-Id ,Link"]);
    }

    #[test]
    fn expose_match_is_case_sensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, "x-correlation-id".parse().unwrap());

        expose_header(&mut headers, CORRELATION_ID_HEADER);

        assert_eq!(exposed(&headers), vec!["x-correlation-id", "X-Correlation-Id"]);
    }

    #[test]
    fn expose_finds_entry_next_to_non_utf8_entry() {
        let declared = HeaderValue::from_bytes(b"X-Correlation-Id, X-Caf\xe9").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, declared.clone());

        expose_header(&mut headers, CORRELATION_ID_HEADER);

        let values: Vec<_> = headers.get_all(ACCESS_CONTROL_EXPOSE_HEADERS).iter().collect();
        assert_eq!(values, vec![&declared]);
    }

    #[test]
    fn expose_appends_after_non_utf8_entry() {
        let declared = HeaderValue::from_bytes(b"X-Caf\xe9").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, declared.clone());

        expose_header(&mut headers, CORRELATION_ID_HEADER);

        let values: Vec<_> = headers.get_all(ACCESS_CONTROL_EXPOSE_HEADERS).iter().collect();
        assert_eq!(values, vec![&declared, &HeaderValue::from_static(CORRELATION_ID_HEADER)]);
    }

    #[test]
    fn display_is_lossy_for_opaque_bytes() {
        let id = CorrelationId::from(HeaderValue::from_bytes(b"ok-\xff").unwrap());
        assert_eq!(id.to_string(), "ok-\u{fffd}");
    }
}
