use clap::Parser;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use super::types::NodeId;
use crate::error::ConfigError;

pub const DEFAULT_REPLICAS: usize = 3;
pub const DEFAULT_FORWARD_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_NODES: &str = "cache-server-1:8000,cache-server-2:8000,cache-server-3:8000";

#[derive(Parser, Debug, Clone)]
#[command(name = "cache-node")]
#[command(about = "Node of a consistent-hashing distributed key-value cache")]
pub struct Args {
    /// Identity of this node as host:port. The port is also the listen port.
    #[arg(long, env = "NODE_ID")]
    pub node_id: String,

    /// Comma-separated host:port list of every cluster member, identical on all nodes.
    #[arg(long, env = "CLUSTER_NODES", value_delimiter = ',', default_value = DEFAULT_NODES)]
    pub nodes: Vec<String>,

    /// Virtual replicas placed on the ring per node.
    #[arg(long, env = "RING_REPLICAS", default_value_t = DEFAULT_REPLICAS)]
    pub replicas: usize,

    /// Timeout applied to every forwarded request, in milliseconds.
    #[arg(long, env = "FORWARD_TIMEOUT_MS", default_value_t = DEFAULT_FORWARD_TIMEOUT_MS)]
    pub forward_timeout_ms: u64,

    /// Interface to bind the HTTP server to.
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Period of the shard stats log line in seconds (0 disables it).
    #[arg(long, env = "STATS_INTERVAL_SECS", default_value_t = 30)]
    pub stats_interval_secs: u64,
}

/// Validated, immutable view of the cluster handed to the ring and router.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub local: NodeId,
    pub members: Vec<NodeId>,
    pub replicas: usize,
    pub forward_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub stats_interval: Option<Duration>,
}

impl ClusterConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let local: NodeId = args.node_id.parse()?;

        let mut members = Vec::with_capacity(args.nodes.len());
        let mut seen = HashSet::new();
        for raw in args.nodes.iter().filter(|raw| !raw.trim().is_empty()) {
            let node: NodeId = raw.parse()?;
            if !seen.insert(node.clone()) {
                return Err(ConfigError::DuplicateMember(node));
            }
            members.push(node);
        }

        if members.is_empty() {
            return Err(ConfigError::EmptyMembership);
        }
        if args.replicas == 0 {
            return Err(ConfigError::ZeroReplicas);
        }

        let port = local.port().ok_or_else(|| ConfigError::InvalidNodeId {
            value: local.to_string(),
            reason: "missing port".to_string(),
        })?;
        let bind_addr: SocketAddr = format!("{}:{}", args.bind_host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidBindHost(args.bind_host.clone()))?;

        let config = Self {
            local,
            members,
            replicas: args.replicas,
            forward_timeout: Duration::from_millis(args.forward_timeout_ms),
            bind_addr,
            stats_interval: (args.stats_interval_secs > 0)
                .then(|| Duration::from_secs(args.stats_interval_secs)),
        };

        if !config.is_member() {
            tracing::warn!(
                "Node {} is not a cluster member, every request will be forwarded",
                config.local
            );
        }

        Ok(config)
    }

    pub fn is_member(&self) -> bool {
        self.members.contains(&self.local)
    }
}
