//! Consistent Hash Ring
//!
//! Assigns every key to exactly one node of the static membership.
//!
//! ## Core Concepts
//! - **Virtual replicas**: each node is hashed onto the ring `R` times
//!   (`"{node}:{i}"`, `i` in `0..R`) to smooth the load between nodes.
//! - **Successor lookup**: a key belongs to the first ring point at or after
//!   its own hash, wrapping around to the lowest point.
//! - **Minimal remapping**: adding or removing a node only moves the keys
//!   whose successor point changed.

pub mod hash_ring;
