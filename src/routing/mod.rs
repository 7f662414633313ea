//! Request Routing Module
//!
//! Every client request is a single-shot decision: look the key up on the
//! ring, then either serve it from the local shard or forward it once to the
//! owning peer and relay the answer.
//!
//! ## Core Concepts
//! - **Local path**: owner is this node, the shard is touched directly and no
//!   outbound call is made.
//! - **Forward path**: exactly one call to the owner's internal endpoint with a
//!   fixed timeout. No retry, no fallback node.
//! - **Error boundary**: all failures become an HTTP status in `RouteError`;
//!   a peer's 404 on reads/deletes is passed through as "not found".

pub mod handlers;
pub mod peer;
pub mod protocol;
pub mod router;
