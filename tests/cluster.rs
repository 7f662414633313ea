//! Integration tests for a real cluster over HTTP.
//!
//! Boots three nodes on ephemeral loopback ports, each with its own shard,
//! ring and forwarding client, and talks to them with reqwest exactly as a
//! client would.

use async_trait::async_trait;
use distributed_cache::cluster::types::NodeId;
use distributed_cache::error::ForwardError;
use distributed_cache::ring::hash_ring::HashRing;
use distributed_cache::routing::peer::{HttpPeerClient, PeerClient};
use distributed_cache::routing::protocol::PeerResponse;
use distributed_cache::routing::router::CacheRouter;
use distributed_cache::server;
use distributed_cache::storage::memory::LocalStore;
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const REPLICAS: usize = 3;

/// Wraps the real HTTP peer client and counts outbound forwards.
struct CountingPeer {
    inner: HttpPeerClient,
    forwards: AtomicUsize,
}

#[async_trait]
impl PeerClient for CountingPeer {
    async fn forward_set(
        &self,
        node: &NodeId,
        key: &str,
        value: &Value,
    ) -> Result<PeerResponse, ForwardError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        self.inner.forward_set(node, key, value).await
    }

    async fn forward_get(&self, node: &NodeId, key: &str) -> Result<PeerResponse, ForwardError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        self.inner.forward_get(node, key).await
    }

    async fn forward_delete(
        &self,
        node: &NodeId,
        key: &str,
    ) -> Result<PeerResponse, ForwardError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        self.inner.forward_delete(node, key).await
    }
}

struct RunningNode {
    id: NodeId,
    router: Arc<CacheRouter>,
    peer: Arc<CountingPeer>,
    _shutdown: oneshot::Sender<()>,
}

/// Binds a peer that accepts TCP connections and holds them open without
/// ever writing a response. The listener stays bound for the whole test.
async fn spawn_silent_peer() -> (NodeId, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let id: NodeId = listener.local_addr().unwrap().to_string().parse().unwrap();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    (id, handle)
}

/// Test harness for a cluster of real nodes with HTTP networking.
struct TestCluster {
    members: Vec<NodeId>,
    nodes: Vec<RunningNode>,
    ring: HashRing,
    client: reqwest::Client,
}

impl TestCluster {
    async fn spawn(n: usize) -> Self {
        Self::spawn_with_silent(n, 0, Duration::from_secs(2)).await
    }

    /// Spawns `live` nodes plus `silent` members that accept connections but
    /// never answer. Every node forwards with `forward_timeout`.
    async fn spawn_with_silent(live: usize, silent: usize, forward_timeout: Duration) -> Self {
        let mut listeners = Vec::new();
        for _ in 0..live {
            listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
        }

        let mut members: Vec<NodeId> = listeners
            .iter()
            .map(|listener| listener.local_addr().unwrap().to_string().parse().unwrap())
            .collect();

        for _ in 0..silent {
            let (id, _) = spawn_silent_peer().await;
            members.push(id);
        }

        let mut nodes = Vec::new();
        for (listener, id) in listeners.into_iter().zip(members.clone()) {
            let peer = Arc::new(CountingPeer {
                inner: HttpPeerClient::new(forward_timeout),
                forwards: AtomicUsize::new(0),
            });
            let router = Arc::new(CacheRouter::new(
                id.clone(),
                HashRing::build(&members, REPLICAS),
                Arc::new(LocalStore::new()),
                peer.clone(),
            ));

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            tokio::spawn(server::serve(listener, router.clone(), async {
                let _ = shutdown_rx.await;
            }));

            nodes.push(RunningNode {
                id,
                router,
                peer,
                _shutdown: shutdown_tx,
            });
        }

        Self {
            ring: HashRing::build(&members, REPLICAS),
            members,
            nodes,
            client: reqwest::Client::new(),
        }
    }

    fn index_of(&self, id: &NodeId) -> usize {
        self.nodes
            .iter()
            .position(|node| &node.id == id)
            .expect("owner should be a live node")
    }

    fn owner_index(&self, key: &str) -> usize {
        self.index_of(self.ring.locate(key).unwrap())
    }

    fn url(&self, node: usize, key: Option<&str>) -> Url {
        let mut url = Url::parse(&format!("http://{}/", self.nodes[node].id)).unwrap();
        if let Some(key) = key {
            url.path_segments_mut().unwrap().pop_if_empty().push(key);
        }
        url
    }

    fn forwards(&self, node: usize) -> usize {
        self.nodes[node].peer.forwards.load(Ordering::SeqCst)
    }

    async fn set(&self, node: usize, body: Value) -> (StatusCode, String) {
        let response = self
            .client
            .post(self.url(node, None))
            .json(&body)
            .send()
            .await
            .unwrap();
        (response.status(), response.text().await.unwrap())
    }

    async fn get(&self, node: usize, key: &str) -> (StatusCode, String) {
        let response = self.client.get(self.url(node, Some(key))).send().await.unwrap();
        (response.status(), response.text().await.unwrap())
    }

    async fn delete(&self, node: usize, key: &str) -> (StatusCode, String) {
        let response = self
            .client
            .delete(self.url(node, Some(key)))
            .send()
            .await
            .unwrap();
        (response.status(), response.text().await.unwrap())
    }

    /// Finds a key owned by `owner`.
    fn key_owned_by(&self, owner: usize) -> String {
        (0..10_000)
            .map(|i| format!("key-{}", i))
            .find(|key| self.owner_index(key) == owner)
            .unwrap()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn alpha_written_on_one_node_is_read_from_another() {
    let cluster = TestCluster::spawn(3).await;

    let owner = cluster.owner_index("alpha");
    let entry = (owner + 1) % 3;
    let reader = (owner + 2) % 3;

    let (status, body) = cluster.set(entry, json!({"alpha": "1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(cluster.forwards(entry), 1, "Entry node should forward exactly once");
    assert_eq!(cluster.forwards(owner), 0, "Owner serves the internal call locally");

    assert_eq!(cluster.nodes[owner].router.store().get("alpha"), Some(json!("1")));
    assert!(cluster.nodes[entry].router.store().get("alpha").is_none());

    let (status, body) = cluster.get(reader, "alpha").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"alpha": "1"}));
    assert_eq!(cluster.forwards(reader), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn owner_serves_its_keys_without_forwarding() {
    let cluster = TestCluster::spawn(3).await;

    for owner in 0..3 {
        let key = cluster.key_owned_by(owner);
        let (status, _) = cluster.set(owner, json!({ key.clone(): owner })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = cluster.get(owner, &key).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ key: owner }));
        assert_eq!(cluster.forwards(owner), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_node_sees_every_write() {
    let cluster = TestCluster::spawn(3).await;

    for i in 0..30 {
        let key = format!("item-{}", i);
        let (status, _) = cluster.set(i % 3, json!({ key.clone(): {"n": i} })).await;
        assert_eq!(status, StatusCode::OK);
    }

    for i in 0..30 {
        let key = format!("item-{}", i);
        for node in 0..3 {
            let (status, body) = cluster.get(node, &key).await;
            assert_eq!(status, StatusCode::OK, "{} via node {}", key, node);
            assert_eq!(
                serde_json::from_str::<Value>(&body).unwrap(),
                json!({ key.clone(): {"n": i} })
            );
        }
    }

    let total: usize = cluster.nodes.iter().map(|node| node.router.store().len()).sum();
    assert_eq!(total, 30, "Each key lives on exactly one node");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missing_key_is_not_found_everywhere() {
    let cluster = TestCluster::spawn(3).await;

    for node in 0..3 {
        let (status, _) = cluster.get(node, "missing-key").await;
        assert_eq!(status, StatusCode::NOT_FOUND, "via node {}", node);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_reports_presence_then_absence() {
    let cluster = TestCluster::spawn(3).await;
    let owner = cluster.owner_index("victim");
    let other = (owner + 1) % 3;

    let (status, body) = cluster.delete(other, "victim").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "0"));

    cluster.set(owner, json!({"victim": [1, 2, 3]})).await;

    let (status, body) = cluster.delete(other, "victim").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "1"));

    let (status, body) = cluster.delete(owner, "victim").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "0"));

    let (status, _) = cluster.get(other, "victim").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn malformed_set_is_rejected_at_entry_node() {
    let cluster = TestCluster::spawn(3).await;

    for node in 0..3 {
        for body in [json!({}), json!({"a": 1, "b": 2}), json!(["a", 1])] {
            let (status, _) = cluster.set(node, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let response = cluster
            .client
            .post(cluster.url(node, None))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(cluster.forwards(node), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keys_with_reserved_characters_round_trip() {
    let cluster = TestCluster::spawn(3).await;
    let key = "a b/c?d";
    let owner = cluster.owner_index(key);
    let entry = (owner + 1) % 3;

    let (status, _) = cluster.set(entry, json!({ key: "spaced" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cluster.nodes[owner].router.store().get(key), Some(json!("spaced")));

    let (status, body) = cluster.get(entry, key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ key: "spaced" }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn internal_endpoints_act_locally_without_routing() {
    let cluster = TestCluster::spawn(3).await;
    let key = cluster.key_owned_by(0);
    let non_owner = 1;

    let response = cluster
        .client
        .post(format!("http://{}/internal/set/{}", cluster.nodes[non_owner].id, key))
        .json(&json!({"raw": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");

    assert_eq!(
        cluster.nodes[non_owner].router.store().get(&key),
        Some(json!({"raw": true}))
    );
    assert!(cluster.nodes[0].router.store().get(&key).is_none());
    assert_eq!(cluster.forwards(non_owner), 0);

    let data_url = format!("http://{}/internal/data/{}", cluster.nodes[non_owner].id, key);
    let response = cluster.client.get(&data_url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = cluster.client.delete(&data_url).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "1");

    let response = cluster.client.get(&data_url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn peer_client_times_out_on_silent_peer() {
    let (silent, _peer) = spawn_silent_peer().await;
    let client = HttpPeerClient::new(Duration::from_millis(200));

    let started = Instant::now();
    let result = client.forward_get(&silent, "anything").await;
    let elapsed = started.elapsed();

    match result {
        Err(ForwardError::Transport(e)) => assert!(e.is_timeout(), "Expected a timeout, got {}", e),
        other => panic!("Expected a transport timeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(200), "Returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "Timeout not enforced: {:?}", elapsed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn silent_owner_yields_server_error() {
    let cluster = TestCluster::spawn_with_silent(2, 1, Duration::from_millis(200)).await;
    let silent = cluster.members[2].clone();

    let key = (0..10_000)
        .map(|i| format!("key-{}", i))
        .find(|key| cluster.ring.locate(key) == Some(&silent))
        .unwrap();

    let (status, _) = cluster.set(0, json!({ key.clone(): 1 })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = cluster.get(1, &key).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = cluster.delete(0, &key).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(cluster.forwards(0) + cluster.forwards(1), 3, "No retries on failure");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dot_segment_keys_are_rejected_at_every_node() {
    let cluster = TestCluster::spawn(3).await;

    for node in 0..3 {
        for key in [".", ".."] {
            let (status, _) = cluster.set(node, json!({ key: 1 })).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "SET '{}' via node {}", key, node);
        }
        assert_eq!(cluster.forwards(node), 0);
    }

    let total: usize = cluster.nodes.iter().map(|node| node.router.store().len()).sum();
    assert_eq!(total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dotted_keys_round_trip_through_forwarding() {
    let cluster = TestCluster::spawn(3).await;

    for key in ["...", ".hidden", "v1.2"] {
        let owner = cluster.owner_index(key);
        let entry = (owner + 1) % 3;

        let (status, _) = cluster.set(entry, json!({ key: "dotted" })).await;
        assert_eq!(status, StatusCode::OK, "SET '{}'", key);
        assert_eq!(cluster.nodes[owner].router.store().get(key), Some(json!("dotted")));

        let (status, body) = cluster.get(entry, key).await;
        assert_eq!(status, StatusCode::OK, "GET '{}'", key);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ key: "dotted" }));
    }
}
