//! Terminal ticker: symbol lists in, formatted quote lines out.

use chrono::{DateTime, Utc};
use price_feed::{FeedError, Quote, Result, Snapshot};
use std::io::BufRead;

/// Read symbols separated by commas, whitespace or new lines; uppercased, deduplicated.
pub fn read_symbols<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(FeedError::Io)?;
        for symbol in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
        {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }
    Ok(symbols)
}

/// One display line, e.g. `▲ BTC      Bitcoin        $50,123.45   +0.25%`.
pub fn render_line(quote: &Quote) -> String {
    let arrow = if quote.is_positive() { '▲' } else { '▼' };
    format!(
        "{} {:<8} {:<14} {:>14} {:>8}",
        arrow,
        quote.symbol(),
        quote.display_name(),
        quote.formatted_price(),
        quote.formatted_change()
    )
}

/// Drops snapshots that arrive out of order.
#[derive(Default)]
pub struct TickerBoard {
    last_seen: Option<DateTime<Utc>>,
}

impl TickerBoard {
    /// Lines to print for `snapshot`, or `None` if it is older than one already shown.
    pub fn accept(&mut self, snapshot: &Snapshot) -> Option<Vec<String>> {
        if let (Some(seen), Some(at)) = (self.last_seen, snapshot.updated_at) {
            if at < seen {
                return None;
            }
        }
        if snapshot.updated_at.is_some() {
            self.last_seen = snapshot.updated_at;
        }
        Some(snapshot.quotes.iter().map(render_line).collect())
    }
}
