//! Error types for the cache node.
//!
//! `ConfigError` is fatal and only ever surfaces at startup. `RouteError` is
//! the per-request boundary: every failure inside routing ends up as one of
//! its variants and is turned into an HTTP status, never propagated further.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::cluster::types::NodeId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid node id '{value}': {reason}")]
    InvalidNodeId { value: String, reason: String },

    #[error("invalid bind host '{0}': expected an IP address")]
    InvalidBindHost(String),

    #[error("cluster membership is empty")]
    EmptyMembership,

    #[error("ring replica count must be at least 1")]
    ZeroReplicas,

    #[error("node {0} is listed more than once in the membership")]
    DuplicateMember(NodeId),
}

/// Failure of a single forwarded call to a peer.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid peer url for {0}")]
    InvalidUrl(NodeId),

    #[error("peer answered with status {0}")]
    Status(StatusCode),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("key not found")]
    NotFound,

    #[error("forward to {node} failed: {source}")]
    Forward {
        node: NodeId,
        #[source]
        source: ForwardError,
    },

    #[error("hash ring is empty")]
    NoOwner,
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::Forward { .. } | RouteError::NoOwner => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RouteError::BadRequest(reason) => reason.clone(),
            RouteError::NotFound => "Not Found".to_string(),
            RouteError::Forward { .. } | RouteError::NoOwner => {
                "Internal Server Error".to_string()
            }
        };
        (status, body).into_response()
    }
}
