//! Command-line arguments for the feed client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Server IP address (IPv4 or IPv6) where the feed server is running.
    #[clap(long)]
    pub server_ip: String,

    /// Local UDP port to bind for receiving snapshots and sending pings.
    #[clap(long, default_value_t = 0)]
    pub listen_port: u16,

    /// Symbols to watch, comma separated (e.g. `BTC,ETH`). Empty means all.
    #[clap(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Path to a text file with symbols to watch.
    /// Symbols may be separated by commas, spaces, or new lines.
    #[clap(long)]
    pub path: Option<String>,
}
