use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::peer::PeerClient;
use super::protocol::{PeerResponse, Reply, validate_key};
use crate::cluster::types::NodeId;
use crate::error::{ForwardError, RouteError};
use crate::ring::hash_ring::HashRing;
use crate::storage::memory::LocalStore;

/// Decides, per request, whether this node serves a key from its own shard
/// or relays the operation to the owning peer.
///
/// The ring lock is only held while locating the owner; it is released
/// before any store access or network call.
pub struct CacheRouter {
    local: NodeId,
    ring: RwLock<HashRing>,
    store: Arc<LocalStore>,
    peers: Arc<dyn PeerClient>,
}

impl CacheRouter {
    pub fn new(
        local: NodeId,
        ring: HashRing,
        store: Arc<LocalStore>,
        peers: Arc<dyn PeerClient>,
    ) -> Self {
        Self {
            local,
            ring: RwLock::new(ring),
            store,
            peers,
        }
    }

    pub fn local_node(&self) -> &NodeId {
        &self.local
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub async fn locate(&self, key: &str) -> Option<NodeId> {
        self.ring.read().await.locate(key).cloned()
    }

    pub async fn add_node(&self, node: &NodeId) {
        self.ring.write().await.add_node(node);
        tracing::info!("Added {} to the ring", node);
    }

    pub async fn remove_node(&self, node: &NodeId) -> usize {
        let removed = self.ring.write().await.remove_node(node);
        tracing::info!("Removed {} from the ring ({} points)", node, removed);
        removed
    }

    async fn owner_of(&self, key: &str) -> Result<NodeId, RouteError> {
        self.locate(key).await.ok_or(RouteError::NoOwner)
    }

    // --- Client operations (routed) ---

    pub async fn handle_set(&self, key: String, value: Value) -> Result<Reply, RouteError> {
        tracing::info!("External SET: key='{}'", key);
        validate_key(&key)?;
        let owner = self.owner_of(&key).await?;

        if owner == self.local {
            return Ok(self.internal_set(key, value));
        }

        tracing::info!("Forwarding SET to [{}]", owner);
        let result = self.peers.forward_set(&owner, &key, &value).await;
        relay(owner, result, false)
    }

    pub async fn handle_get(&self, key: &str) -> Result<Reply, RouteError> {
        tracing::info!("External GET: key='{}'", key);
        validate_key(key)?;
        let owner = self.owner_of(key).await?;

        if owner == self.local {
            return self.internal_get(key);
        }

        tracing::info!("Forwarding GET to [{}]", owner);
        let result = self.peers.forward_get(&owner, key).await;
        relay(owner, result, true)
    }

    pub async fn handle_delete(&self, key: &str) -> Result<Reply, RouteError> {
        tracing::info!("External DELETE: key='{}'", key);
        validate_key(key)?;
        let owner = self.owner_of(key).await?;

        if owner == self.local {
            return Ok(self.internal_delete(key));
        }

        tracing::info!("Forwarding DELETE to [{}]", owner);
        let result = self.peers.forward_delete(&owner, key).await;
        relay(owner, result, true)
    }

    // --- Internal operations (local shard only, never re-routed) ---

    pub fn internal_set(&self, key: String, value: Value) -> Reply {
        tracing::debug!("[internal] SET: key='{}'", key);
        self.store.set(key, value);
        Reply::Stored
    }

    pub fn internal_get(&self, key: &str) -> Result<Reply, RouteError> {
        tracing::debug!("[internal] GET: key='{}'", key);
        match self.store.get(key) {
            Some(value) => Ok(Reply::Found {
                key: key.to_string(),
                value,
            }),
            None => Err(RouteError::NotFound),
        }
    }

    pub fn internal_delete(&self, key: &str) -> Reply {
        tracing::debug!("[internal] DELETE: key='{}'", key);
        Reply::Deleted(self.store.delete(key))
    }
}

/// Turns the peer's answer into the reply for the original client.
///
/// A 404 is a legitimate "not found" for reads and deletes; for writes it
/// means the peer is misbehaving and counts as a failed forward.
fn relay(
    owner: NodeId,
    result: Result<PeerResponse, ForwardError>,
    not_found_is_absent: bool,
) -> Result<Reply, RouteError> {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Forward to [{}] failed: {}", owner, e);
            return Err(RouteError::Forward {
                node: owner,
                source: e,
            });
        }
    };

    if not_found_is_absent && response.status == StatusCode::NOT_FOUND {
        return Err(RouteError::NotFound);
    }

    if !response.status.is_success() {
        tracing::error!(
            "Forward to [{}] failed: peer answered {}",
            owner,
            response.status
        );
        return Err(RouteError::Forward {
            node: owner,
            source: ForwardError::Status(response.status),
        });
    }

    Ok(Reply::Relayed(response))
}
