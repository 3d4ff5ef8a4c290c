//! Feed configuration and the built-in crypto/forex presets.
//!
//! Both feeds run on the same `PriceFeedCache`; what differs between them is data:
//! the seed list, the refresh cadence and the small-price formatting threshold.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::format::PriceFormat;
use crate::result::Result;
use crate::seed::{SeedParser, SeedQuote};
use crate::source::DEFAULT_MAX_MOVE;

/// Built-in feed kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum FeedKind {
    /// Cryptocurrency quotes in USD.
    Crypto,
    /// Currency pairs.
    Forex,
}

impl FeedKind {
    /// Default delay between refresh cycles.
    pub fn default_interval(self) -> Duration {
        match self {
            FeedKind::Crypto => Duration::from_secs(10),
            FeedKind::Forex => Duration::from_secs(30),
        }
    }

    /// Display format; forex keeps 4 decimals up to 10 so pips stay visible.
    pub fn price_format(self) -> PriceFormat {
        match self {
            FeedKind::Crypto => PriceFormat::default(),
            FeedKind::Forex => PriceFormat::with_threshold(10.0),
        }
    }

    /// Built-in seed list.
    pub fn default_seeds(self) -> Vec<SeedQuote> {
        match self {
            FeedKind::Crypto => vec![
                SeedQuote::new("BTC", "Bitcoin", 50000.0),
                SeedQuote::new("ETH", "Ethereum", 3000.0),
                SeedQuote::new("SOL", "Solana", 150.0),
                SeedQuote::new("BNB", "BNB", 580.0),
                SeedQuote::new("XRP", "XRP", 0.52),
                SeedQuote::new("ADA", "Cardano", 0.45),
                SeedQuote::new("DOGE", "Dogecoin", 0.08),
            ],
            FeedKind::Forex => vec![
                SeedQuote::new("EURUSD", "EUR/USD", 1.0864),
                SeedQuote::new("GBPUSD", "GBP/USD", 1.2650),
                SeedQuote::new("USDJPY", "USD/JPY", 149.50),
                SeedQuote::new("AUDUSD", "AUD/USD", 0.6550),
                SeedQuote::new("USDCHF", "USD/CHF", 0.8810),
                SeedQuote::new("USDCAD", "USD/CAD", 1.3560),
            ],
        }
    }
}

/// Everything a cache needs besides its quote source.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Which preset the feed was built from.
    pub kind: FeedKind,
    /// Minimum time between refreshes; also the delay between auto-refresh cycles.
    pub refresh_interval: Duration,
    /// Display format applied to every quote.
    pub format: PriceFormat,
    /// Random-walk bound used by the simulated source, as a fraction.
    pub max_move: f64,
    /// Initial quotes.
    pub seeds: Vec<SeedQuote>,
}

impl FeedConfig {
    /// Configuration with all preset defaults for `kind`.
    pub fn preset(kind: FeedKind) -> Self {
        Self {
            kind,
            refresh_interval: kind.default_interval(),
            format: kind.price_format(),
            max_move: DEFAULT_MAX_MOVE,
            seeds: kind.default_seeds(),
        }
    }

    /// Override the refresh interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Replace the preset seeds.
    pub fn with_seeds(mut self, seeds: Vec<SeedQuote>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Replace the preset seeds with the contents of a seed file.
    pub fn with_seed_file(self, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let seeds = SeedQuote::parse_from_file(BufReader::new(file))?;
        Ok(self.with_seeds(seeds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Crypto".parse::<FeedKind>().unwrap(), FeedKind::Crypto);
        assert_eq!("FOREX".parse::<FeedKind>().unwrap(), FeedKind::Forex);
        assert_eq!(FeedKind::Forex.to_string(), "forex");
    }

    #[test]
    fn presets_differ_in_cadence_and_format() {
        let crypto = FeedConfig::preset(FeedKind::Crypto);
        let forex = FeedConfig::preset(FeedKind::Forex);
        assert!(crypto.refresh_interval < forex.refresh_interval);
        assert_eq!(forex.format.price(1.0864), "$1.0864");
        assert_eq!(crypto.format.price(1.0864), "$1.09");
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = FeedConfig::preset(FeedKind::Crypto)
            .with_interval(Duration::from_millis(250))
            .with_seeds(vec![SeedQuote::new("BTC", "Bitcoin", 1.0)]);
        assert_eq!(config.refresh_interval, Duration::from_millis(250));
        assert_eq!(config.seeds.len(), 1);
    }

    #[test]
    fn missing_seed_file_is_io_error() {
        let result = FeedConfig::preset(FeedKind::Crypto)
            .with_seed_file(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(crate::FeedError::Io(_))));
    }
}
