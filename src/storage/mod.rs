//! Local Storage Module
//!
//! Holds the in-memory shard owned by this node. Nothing outside this
//! process ever touches it directly: other nodes reach it only through the
//! internal HTTP endpoints served by the routing layer.
//!
//! No TTL, no eviction, no persistence. Entries live for the lifetime of
//! the process.

pub mod memory;
