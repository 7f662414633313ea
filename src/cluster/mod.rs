//! Cluster Identity & Configuration
//!
//! Membership is static: every process is started with the same list of
//! `host:port` identities and its own identity out of that list. Nothing is
//! discovered at runtime, so the whole cluster view can be validated once at
//! startup and then handed to the ring and the router as plain data.

pub mod config;
pub mod types;
