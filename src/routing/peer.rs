use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;

use super::protocol::{INTERNAL_DATA_SEGMENTS, INTERNAL_SET_SEGMENTS, PeerResponse};
use crate::cluster::types::NodeId;
use crate::error::ForwardError;

/// Outbound side of forwarding: one call to the owning peer's internal
/// endpoint per routed request. No retries.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn forward_set(
        &self,
        node: &NodeId,
        key: &str,
        value: &Value,
    ) -> Result<PeerResponse, ForwardError>;

    async fn forward_get(&self, node: &NodeId, key: &str) -> Result<PeerResponse, ForwardError>;

    async fn forward_delete(
        &self,
        node: &NodeId,
        key: &str,
    ) -> Result<PeerResponse, ForwardError>;
}

/// `PeerClient` over HTTP with a shared connection pool and a fixed
/// per-request timeout. A timeout is reported like any other transport error.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    fn internal_url(node: &NodeId, segments: [&str; 2], key: &str) -> Result<Url, ForwardError> {
        let mut url = Url::parse(&format!("http://{}", node))
            .map_err(|_| ForwardError::InvalidUrl(node.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ForwardError::InvalidUrl(node.clone()))?
            .pop_if_empty()
            .extend(segments)
            .push(key);
        Ok(url)
    }

    async fn read_response(response: reqwest::Response) -> Result<PeerResponse, ForwardError> {
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;
        Ok(PeerResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn forward_set(
        &self,
        node: &NodeId,
        key: &str,
        value: &Value,
    ) -> Result<PeerResponse, ForwardError> {
        let url = Self::internal_url(node, INTERNAL_SET_SEGMENTS, key)?;
        let response = self
            .http_client
            .post(url)
            .json(value)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn forward_get(&self, node: &NodeId, key: &str) -> Result<PeerResponse, ForwardError> {
        let url = Self::internal_url(node, INTERNAL_DATA_SEGMENTS, key)?;
        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn forward_delete(
        &self,
        node: &NodeId,
        key: &str,
    ) -> Result<PeerResponse, ForwardError> {
        let url = Self::internal_url(node, INTERNAL_DATA_SEGMENTS, key)?;
        let response = self
            .http_client
            .delete(url)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::read_response(response).await
    }
}
