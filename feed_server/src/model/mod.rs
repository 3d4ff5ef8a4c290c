//! Server-side state kept per client.
//!
//! - `ping_monitor` — in-memory keep-alive tracker for client timeouts.

pub mod ping_monitor;
