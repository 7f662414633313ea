//! HTTP server assembly.
//!
//! Builds the axum application serving both the client surface and the
//! peer surface from a single `CacheRouter`.

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::routing::handlers::{
    handle_delete, handle_get, handle_internal_delete, handle_internal_get, handle_internal_set,
    handle_set,
};
use crate::routing::protocol::{ROUTE_INTERNAL_DATA, ROUTE_INTERNAL_SET, ROUTE_KEY, ROUTE_SET};
use crate::routing::router::CacheRouter;

pub fn app(router: Arc<CacheRouter>) -> Router {
    Router::new()
        .route(ROUTE_SET, post(handle_set))
        .route(ROUTE_KEY, get(handle_get).delete(handle_delete))
        .route(ROUTE_INTERNAL_SET, post(handle_internal_set))
        .route(
            ROUTE_INTERNAL_DATA,
            get(handle_internal_get).delete(handle_internal_delete),
        )
        .layer(Extension(router))
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(
    listener: TcpListener,
    router: Arc<CacheRouter>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(router))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
