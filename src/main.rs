use clap::Parser;
use distributed_cache::cluster::config::{Args, ClusterConfig};
use distributed_cache::ring::hash_ring::HashRing;
use distributed_cache::routing::peer::HttpPeerClient;
use distributed_cache::routing::router::CacheRouter;
use distributed_cache::server;
use distributed_cache::storage::memory::LocalStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ClusterConfig::from_args(Args::parse())?;

    tracing::info!("Starting node {}", config.local);

    // 1. Ring, derived identically on every node from the static membership:
    let ring = HashRing::build(&config.members, config.replicas);
    if ring.is_empty() {
        anyhow::bail!("hash ring is empty, refusing to start");
    }
    tracing::info!(
        "Ring members: {:?} (replicas={}, forward timeout={:?})",
        ring.nodes().iter().map(|node| node.as_str()).collect::<Vec<_>>(),
        ring.replicas(),
        config.forward_timeout
    );
    tracing::info!(
        "Local node holds {} of {} ring points",
        ring.points_of(&config.local),
        ring.len()
    );

    // 2. Local shard and forwarding client:
    let store = Arc::new(LocalStore::new());
    let peers = Arc::new(HttpPeerClient::new(config.forward_timeout));

    let router = Arc::new(CacheRouter::new(
        config.local.clone(),
        ring,
        store.clone(),
        peers,
    ));

    // 3. Spawn stats reporter:
    if let Some(period) = config.stats_interval {
        let stats_store = store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;
                tracing::info!("Shard stats: {} entries held locally", stats_store.len());
            }
        });
    }

    // 4. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    server::serve(listener, router.clone(), shutdown_signal()).await?;

    tracing::info!("Node {} stopped", router.local_node());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
