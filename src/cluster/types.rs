use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Identity of a cache node, always of the form `host:port`.
///
/// The identity doubles as the node's network address: peers forward to
/// `http://{node_id}/internal/...`, so it must be resolvable from every
/// other member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> &str {
        self.0.rsplit_once(':').map(|(host, _)| host).unwrap_or(&self.0)
    }

    pub fn port(&self) -> Option<u16> {
        self.0.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
    }
}

impl FromStr for NodeId {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let invalid = |reason: &str| ConfigError::InvalidNodeId {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if host.contains(char::is_whitespace) || host.contains('/') {
            return Err(invalid("host contains illegal characters"));
        }

        match port.parse::<u16>() {
            Ok(0) => Err(invalid("port must be non-zero")),
            Ok(_) => Ok(NodeId(raw.to_string())),
            Err(_) => Err(invalid("port is not a number in 1..=65535")),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
