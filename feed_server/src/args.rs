//! Command-line arguments for the feed server.
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use price_feed::net::{COMMAND_PORT, DATA_PORT, PING_TIMEOUT_SECS};
use price_feed::{FeedConfig, FeedKind, Result};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Which built-in feed to serve.
    #[clap(long, value_enum, default_value_t = FeedKind::Crypto)]
    pub feed: FeedKind,

    /// Seed file replacing the preset quotes (`SYMBOL,Display Name,price` per line).
    #[clap(long)]
    pub seed_file: Option<PathBuf>,

    /// Refresh interval in milliseconds; defaults to the feed preset.
    #[clap(long)]
    pub interval_ms: Option<u64>,

    /// Address to bind both sockets to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// TCP port for subscription commands.
    #[clap(long, default_value_t = COMMAND_PORT)]
    pub command_port: u16,

    /// UDP port for snapshots and pings.
    #[clap(long, default_value_t = DATA_PORT)]
    pub data_port: u16,

    /// Seconds without a PING before a client is dropped.
    #[clap(long, default_value_t = PING_TIMEOUT_SECS)]
    pub ping_timeout_secs: u64,
}

impl Args {
    /// Build the feed configuration from the preset and any overrides.
    pub fn feed_config(&self) -> Result<FeedConfig> {
        let mut config = FeedConfig::preset(self.feed);
        if let Some(ms) = self.interval_ms {
            config = config.with_interval(Duration::from_millis(ms));
        }
        if let Some(path) = &self.seed_file {
            config = config.with_seed_file(path)?;
        }
        Ok(config)
    }
}
