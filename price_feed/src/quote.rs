//! Quote data model.
//!
//! A `Quote` is one symbol's current market snapshot: the raw price and change
//! percentage, plus presentation strings derived from them. The derived fields are
//! private and only ever computed from the raw ones, both on construction and on
//! deserialization, so they can never go stale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::format::PriceFormat;
use crate::result::Result;

/// Market snapshot for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuoteRecord")]
pub struct Quote {
    symbol: String,
    display_name: String,
    raw_price: f64,
    raw_change_percent: f64,
    formatted_price: String,
    formatted_change: String,
    is_positive: bool,
    format: PriceFormat,
}

/// Wire shape of a quote; derived strings are ignored on the way in.
#[derive(Deserialize)]
struct QuoteRecord {
    symbol: String,
    display_name: String,
    raw_price: f64,
    raw_change_percent: f64,
    #[serde(default)]
    format: PriceFormat,
}

impl TryFrom<QuoteRecord> for Quote {
    type Error = FeedError;

    fn try_from(record: QuoteRecord) -> Result<Self> {
        Quote::new(
            &record.symbol,
            &record.display_name,
            record.raw_price,
            record.raw_change_percent,
            record.format,
        )
    }
}

impl Quote {
    /// Build a quote, normalising the symbol to uppercase and deriving the display fields.
    ///
    /// Fails with `FeedError::InvalidSeed` for an empty symbol and
    /// `FeedError::InvalidPrice` unless the price is finite and strictly positive.
    pub fn new(
        symbol: &str,
        display_name: &str,
        price: f64,
        change_percent: f64,
        format: PriceFormat,
    ) -> Result<Self> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(FeedError::InvalidSeed("empty symbol".to_string()));
        }
        validate_price(&symbol, price)?;
        if !change_percent.is_finite() {
            return Err(FeedError::Format(format!(
                "non-finite change {} for {}",
                change_percent, symbol
            )));
        }

        Ok(Self {
            formatted_price: format.price(price),
            formatted_change: format.change(change_percent),
            is_positive: change_percent >= 0.0,
            symbol,
            display_name: display_name.to_string(),
            raw_price: price,
            raw_change_percent: change_percent,
            format,
        })
    }

    /// Same symbol and label with a new price and change; derived fields are recomputed.
    pub fn with_update(&self, price: f64, change_percent: f64) -> Result<Self> {
        Self::new(
            &self.symbol,
            &self.display_name,
            price,
            change_percent,
            self.format,
        )
    }

    /// Uppercase symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Current price.
    pub fn raw_price(&self) -> f64 {
        self.raw_price
    }

    /// Signed change since the previous refresh, in percent.
    pub fn raw_change_percent(&self) -> f64 {
        self.raw_change_percent
    }

    /// Price as shown to users.
    pub fn formatted_price(&self) -> &str {
        &self.formatted_price
    }

    /// Change as shown to users.
    pub fn formatted_change(&self) -> &str {
        &self.formatted_change
    }

    /// `true` when the change is zero or positive.
    pub fn is_positive(&self) -> bool {
        self.is_positive
    }

    /// Format used to derive the display strings.
    pub fn format(&self) -> PriceFormat {
        self.format
    }
}

/// Full state of a cache at one point in time, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Quotes in seed order.
    pub quotes: Vec<Quote>,
    /// Completion time of the refresh that produced these quotes; `None` before the first.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Look up a quote by symbol, ignoring case.
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        let symbol = normalize_symbol(symbol);
        self.quotes.iter().find(|q| q.symbol == symbol)
    }

    /// Keep only the quotes whose symbols appear in `symbols` (case-insensitive).
    pub fn filtered(&self, symbols: &[String]) -> Snapshot {
        let wanted: Vec<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
        Snapshot {
            quotes: self
                .quotes
                .iter()
                .filter(|q| wanted.contains(&q.symbol))
                .cloned()
                .collect(),
            updated_at: self.updated_at,
        }
    }

    /// Encode the snapshot to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// New raw values for one symbol, as produced by a `QuoteSource`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    /// Symbol the values belong to.
    pub symbol: String,
    /// New price.
    pub price: f64,
    /// Change relative to the previous price, in percent.
    pub change_percent: f64,
}

/// Canonical form of a symbol key.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Reject prices that are not finite and strictly positive.
pub fn validate_price(symbol: &str, price: f64) -> Result<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(FeedError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc(price: f64, change: f64) -> Quote {
        Quote::new("btc", "Bitcoin", price, change, PriceFormat::default()).unwrap()
    }

    #[test]
    fn derived_fields_follow_raw_values() {
        let q = btc(50123.45, -0.25);
        assert_eq!(q.symbol(), "BTC");
        assert_eq!(q.formatted_price(), "$50,123.45");
        assert_eq!(q.formatted_change(), "-0.25%");
        assert!(!q.is_positive());

        let up = q.with_update(50200.0, 0.15).unwrap();
        assert_eq!(up.formatted_price(), "$50,200.00");
        assert_eq!(up.formatted_change(), "+0.15%");
        assert!(up.is_positive());
        assert_eq!(up.display_name(), "Bitcoin");
    }

    #[test]
    fn rejects_invalid_prices() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Quote::new("ETH", "Ethereum", price, 0.0, PriceFormat::default());
            assert!(matches!(err, Err(FeedError::InvalidPrice { .. })));
        }
    }

    #[test]
    fn rejects_empty_symbol() {
        let err = Quote::new("  ", "Nothing", 1.0, 0.0, PriceFormat::default());
        assert!(matches!(err, Err(FeedError::InvalidSeed(_))));
    }

    #[test]
    fn deserialization_recomputes_display_strings() {
        let json = r#"{
            "symbol": "eurusd",
            "display_name": "EUR/USD",
            "raw_price": 1.0864,
            "raw_change_percent": 0.1,
            "formatted_price": "$999",
            "formatted_change": "bogus",
            "is_positive": false,
            "format": { "small_price_threshold": 10.0 }
        }"#;
        let q: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(q.symbol(), "EURUSD");
        assert_eq!(q.formatted_price(), "$1.0864");
        assert_eq!(q.formatted_change(), "+0.10%");
        assert!(q.is_positive());
    }

    #[test]
    fn deserialization_rejects_bad_price() {
        let json = r#"{"symbol":"X","display_name":"X","raw_price":-3.0,"raw_change_percent":0.0}"#;
        assert!(serde_json::from_str::<Quote>(json).is_err());
    }

    #[test]
    fn snapshot_lookup_and_filter_ignore_case() {
        let snapshot = Snapshot {
            quotes: vec![
                btc(50000.0, 0.0),
                Quote::new("ETH", "Ethereum", 3000.0, 0.0, PriceFormat::default()).unwrap(),
            ],
            updated_at: None,
        };
        assert!(snapshot.get("Btc").is_some());
        assert!(snapshot.get("DOGE").is_none());

        let only_eth = snapshot.filtered(&["eth".to_string()]);
        assert_eq!(only_eth.quotes.len(), 1);
        assert_eq!(only_eth.quotes[0].symbol(), "ETH");
    }
}
