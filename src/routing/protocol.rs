//! Cache Network Protocol
//!
//! Routes of the two HTTP surfaces and the response shapes they produce.
//!
//! The client surface (`/`, `/{key}`) routes every request through the hash
//! ring. The internal surface (`/internal/...`) is only called by other
//! ring members and always acts on the local shard without re-routing.

use axum::Json;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use crate::error::RouteError;

// --- API Routes ---

/// Client write: body is a JSON object with exactly one key/value pair.
pub const ROUTE_SET: &str = "/";
/// Client read and delete of a single key.
pub const ROUTE_KEY: &str = "/:key";
/// Internal write: raw JSON value body, key in the path.
pub const ROUTE_INTERNAL_SET: &str = "/internal/set/:key";
/// Internal read and delete against the local shard only.
pub const ROUTE_INTERNAL_DATA: &str = "/internal/data/:key";

/// Path segments used when building peer URLs; the key is appended as one
/// more percent-encoded segment.
pub const INTERNAL_SET_SEGMENTS: [&str; 2] = ["internal", "set"];
pub const INTERNAL_DATA_SEGMENTS: [&str; 2] = ["internal", "data"];

// --- Response bodies ---

pub const BODY_STORED: &str = "OK";
pub const BODY_DELETED: &str = "1";
pub const BODY_NOT_DELETED: &str = "0";

/// What a peer answered to a forwarded call.
#[derive(Debug, Clone)]
pub struct PeerResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Successful outcome of a routed or internal operation.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Served locally: `"OK"`.
    Stored,
    /// Served locally: `{key: value}`.
    Found { key: String, value: Value },
    /// Served locally: `"1"` when something was removed, `"0"` otherwise.
    Deleted(bool),
    /// Served by the owning peer, relayed verbatim.
    Relayed(PeerResponse),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Stored => (StatusCode::OK, BODY_STORED).into_response(),
            Reply::Found { key, value } => {
                let mut entry = Map::with_capacity(1);
                entry.insert(key, value);
                (StatusCode::OK, Json(Value::Object(entry))).into_response()
            }
            Reply::Deleted(removed) => {
                let body = if removed { BODY_DELETED } else { BODY_NOT_DELETED };
                (StatusCode::OK, body).into_response()
            }
            Reply::Relayed(peer) => {
                let mut response = (peer.status, peer.body).into_response();
                match peer.content_type {
                    Some(content_type) => {
                        response.headers_mut().insert(CONTENT_TYPE, content_type);
                    }
                    None => {
                        response.headers_mut().remove(CONTENT_TYPE);
                    }
                }
                response
            }
        }
    }
}

/// Parses the client write body: exactly one member in a JSON object.
pub fn parse_set_body(body: &[u8]) -> Result<(String, Value), RouteError> {
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| RouteError::BadRequest(format!("body is not valid JSON: {}", e)))?;

    let Value::Object(entries) = document else {
        return Err(RouteError::BadRequest(
            "body must be a JSON object".to_string(),
        ));
    };

    if entries.len() != 1 {
        return Err(RouteError::BadRequest(format!(
            "body must contain exactly one key-value pair, got {}",
            entries.len()
        )));
    }

    let Some((key, value)) = entries.into_iter().next() else {
        return Err(RouteError::BadRequest("body is empty".to_string()));
    };

    validate_key(&key)?;
    Ok((key, value))
}

/// Rejects keys that cannot travel as a single URL path segment. `.` and
/// `..` are dot-segments: URL normalisation collapses them even when
/// percent-encoded, so a forwarded request would never reach the key route.
pub fn validate_key(key: &str) -> Result<(), RouteError> {
    match key {
        "" => Err(RouteError::BadRequest("key must not be empty".to_string())),
        "." | ".." => Err(RouteError::BadRequest(format!(
            "key '{}' is a reserved path segment",
            key
        ))),
        _ => Ok(()),
    }
}

/// Parses the internal write body: any JSON value.
pub fn parse_value_body(body: &[u8]) -> Result<Value, RouteError> {
    serde_json::from_slice(body)
        .map_err(|e| RouteError::BadRequest(format!("value is not valid JSON: {}", e)))
}
