//! Command payloads exchanged between the feed client and server.
//!
//! A `Command` is either a subscription request (`SUBSCRIBE`) naming the symbols the
//! client wants and the UDP port it listens on, or a keep-alive `PING`. Commands travel
//! over the TCP command channel encoded with `bincode`.
use std::net::SocketAddr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::result::Result;

/// Header value for subscription commands.
pub const SUBSCRIBE: &str = "SUBSCRIBE";
/// Header value for keep-alive pings.
pub const PING: &str = "PING";
/// Transport kind for snapshot delivery.
pub const CONNECTION: &str = "udp";

/// Command payload sent from client to server.
#[derive(Debug, Clone, PartialEq, Decode, Encode, Serialize, Deserialize)]
pub struct Command {
    /// Command kind. Either `SUBSCRIBE` or `PING`.
    pub header: String,
    /// Transport protocol name (e.g., `udp`).
    pub connection: String,
    /// IP address the client receives on.
    pub address: String,
    /// Port as a string.
    pub port: String,
    /// Symbols to receive (empty for `PING`; empty `SUBSCRIBE` means every symbol).
    pub symbols: Vec<String>,
}

impl Command {
    /// Creates a new subscription command.
    pub fn new(address: &str, port: &str, symbols: Vec<String>) -> Self {
        Command {
            header: String::from(SUBSCRIBE),
            connection: String::from(CONNECTION),
            address: String::from(address),
            port: String::from(port),
            symbols,
        }
    }

    /// Creates a new keep-alive `PING` command.
    pub fn new_ping(address: &str, port: &str) -> Self {
        Command {
            header: String::from(PING),
            connection: String::from(CONNECTION),
            address: String::from(address),
            port: String::from(port),
            symbols: Vec::new(),
        }
    }

    /// `true` for a subscription request.
    pub fn is_subscribe(&self) -> bool {
        self.header == SUBSCRIBE
    }

    /// Build the UDP socket address from the fields.
    pub fn get_udp_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.address, self.port).parse()
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decode from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (command, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(command)
    }
}
