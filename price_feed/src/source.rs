//! Quote sources.
//!
//! A `QuoteSource` produces the next raw price for every symbol a cache holds. The
//! cache owns validation, formatting and publication; a source only supplies numbers,
//! so a real market-data client can replace the simulated one without touching the
//! cache.
//!
//! `RandomWalkSource` simulates movement with a small random walk: each refresh moves
//! every price by a uniformly sampled amount within `±max_move` of its current value
//! and reports that move as the change percentage.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::quote::{PriceUpdate, Quote};
use crate::result::Result;

/// Default bound of the random walk: ±1% per refresh.
pub const DEFAULT_MAX_MOVE: f64 = 0.01;

/// Capability that supplies fresh prices for a batch of symbols.
pub trait QuoteSource: Send + Sync {
    /// Produce one update per quote in `current`.
    ///
    /// Returning an error, or a batch that misses a symbol, makes the cache keep its
    /// previous snapshot for this cycle.
    fn fetch(&self, current: &[Quote]) -> Result<Vec<PriceUpdate>>;
}

/// Simulated source: bounded random walk around the last price.
pub struct RandomWalkSource {
    rng: Mutex<StdRng>,
    max_move: f64,
}

impl RandomWalkSource {
    /// Random walk seeded from the OS, bounded by `max_move` (a fraction, e.g. `0.01`).
    pub fn new(max_move: f64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), max_move)
    }

    /// Reproducible random walk, used by tests.
    pub fn seeded(seed: u64, max_move: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), max_move)
    }

    fn with_rng(rng: StdRng, max_move: f64) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_move: max_move.abs(),
        }
    }

    /// Sample the next price for `current_price`.
    ///
    /// Returns the new price and the applied move in percent.
    fn next_price(&self, rng: &mut StdRng, current_price: f64) -> (f64, f64) {
        let change: f64 = if self.max_move > 0.0 {
            rng.random_range(-self.max_move..=self.max_move)
        } else {
            0.0
        };
        (current_price * (1.0 + change), change * 100.0)
    }
}

impl Default for RandomWalkSource {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MOVE)
    }
}

impl QuoteSource for RandomWalkSource {
    fn fetch(&self, current: &[Quote]) -> Result<Vec<PriceUpdate>> {
        let mut rng = self.rng.lock();
        Ok(current
            .iter()
            .map(|quote| {
                let (price, change_percent) = self.next_price(&mut rng, quote.raw_price());
                PriceUpdate {
                    symbol: quote.symbol().to_string(),
                    price,
                    change_percent,
                }
            })
            .collect())
    }
}
