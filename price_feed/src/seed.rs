//! Initial quotes and seed-file parsing.

use std::io::BufRead;

use crate::error::FeedError;
use crate::result::Result;

/// One entry of the initial quote list a cache is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedQuote {
    /// Symbol key; normalised to uppercase when seeded.
    pub symbol: String,
    /// Human-readable label.
    pub display_name: String,
    /// Starting price.
    pub price: f64,
    /// Starting change percentage.
    pub change_percent: f64,
}

impl SeedQuote {
    /// Seed with no change yet recorded.
    pub fn new(symbol: &str, display_name: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            price,
            change_percent: 0.0,
        }
    }
}

/// Trait providing file parsing for seed quotes.
pub trait SeedParser: Sized {
    /// Parses seeds from a buffered reader.
    ///
    /// Each non-empty line that does not start with `#` must look like
    /// `SYMBOL,Display Name,price`. Returns an error naming the first bad line.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>>;
}

impl SeedParser for SeedQuote {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>> {
        let mut seeds = Vec::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(FeedError::Io)?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }
            seeds.push(parse_line(trimmed_line).map_err(|reason| FeedError::ParseSeedFile {
                line: index + 1,
                reason,
            })?);
        }
        Ok(seeds)
    }
}

fn parse_line(line: &str) -> std::result::Result<SeedQuote, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [symbol, display_name, price] = fields.as_slice() else {
        return Err(format!("expected 3 comma-separated fields, got {}", fields.len()));
    };
    if symbol.is_empty() {
        return Err("empty symbol".to_string());
    }
    let price: f64 = price
        .parse()
        .map_err(|e| format!("invalid price {:?}: {}", price, e))?;
    Ok(SeedQuote::new(symbol, display_name, price))
}
