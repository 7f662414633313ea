//! Distributed Key-Value Cache Library
//!
//! A fixed set of peer nodes partitions the keyspace with consistent hashing.
//! Each node owns one in-memory shard and can answer any client request,
//! either from its shard or by forwarding once to the owning peer.
//!
//! ## Architecture Modules
//! - **`cluster`**: Static membership and node identity (`host:port`), plus the
//!   startup configuration that validates them.
//! - **`ring`**: The consistent hash ring with virtual replicas that maps every
//!   key to exactly one node.
//! - **`storage`**: The lock-guarded local shard (`LocalStore`).
//! - **`routing`**: The local-vs-forward decision, the peer client used for
//!   forwarding, and the HTTP handlers for the client and peer surfaces.
//! - **`server`**: Assembles and serves the axum application.

pub mod cluster;
pub mod error;
pub mod ring;
pub mod routing;
pub mod server;
pub mod storage;
