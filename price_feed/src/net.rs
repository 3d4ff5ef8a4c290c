//! Shared networking constants and helpers used by the feed server and client.

/// TCP port for the command channel (client -> server).
pub const COMMAND_PORT: u16 = 8080;
/// UDP port for snapshot streaming and pings (server <-> client).
pub const DATA_PORT: u16 = 8081;
/// Keep-alive datagram sent by clients.
pub const PING_MSG: &[u8] = b"PING";
/// Seconds of silence after which the server drops a client.
pub const PING_TIMEOUT_SECS: u64 = 5;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
