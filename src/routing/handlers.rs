use axum::{
    body::Bytes,
    extract::{Extension, Path},
};
use std::sync::Arc;

use super::protocol::{Reply, parse_set_body, parse_value_body};
use super::router::CacheRouter;
use crate::error::RouteError;

// Client surface. The body is validated before the ring is consulted.

pub async fn handle_set(
    Extension(router): Extension<Arc<CacheRouter>>,
    body: Bytes,
) -> Result<Reply, RouteError> {
    let (key, value) = parse_set_body(&body).inspect_err(|e| {
        tracing::warn!("Rejected SET: {}", e);
    })?;
    router.handle_set(key, value).await
}

pub async fn handle_get(
    Extension(router): Extension<Arc<CacheRouter>>,
    Path(key): Path<String>,
) -> Result<Reply, RouteError> {
    router.handle_get(&key).await
}

pub async fn handle_delete(
    Extension(router): Extension<Arc<CacheRouter>>,
    Path(key): Path<String>,
) -> Result<Reply, RouteError> {
    router.handle_delete(&key).await
}

// Peer surface. Trusts the caller to have resolved the owner already.

pub async fn handle_internal_set(
    Extension(router): Extension<Arc<CacheRouter>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Reply, RouteError> {
    let value = parse_value_body(&body)?;
    Ok(router.internal_set(key, value))
}

pub async fn handle_internal_get(
    Extension(router): Extension<Arc<CacheRouter>>,
    Path(key): Path<String>,
) -> Result<Reply, RouteError> {
    router.internal_get(&key)
}

pub async fn handle_internal_delete(
    Extension(router): Extension<Arc<CacheRouter>>,
    Path(key): Path<String>,
) -> Reply {
    router.internal_delete(&key)
}
