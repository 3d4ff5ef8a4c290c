//!
//! Price feed cache and the types shared by the feed server and client.
//!
//! This crate aggregates:
//! - `cache` — `PriceFeedCache`, the latest quote per symbol with subscriber notification.
//! - `scheduler` — the fixed-delay background task behind auto-refresh.
//! - `source` — the `QuoteSource` capability and the simulated random-walk source.
//! - `quote` — `Quote` and `Snapshot` data types.
//! - `format` — price and change presentation rules.
//! - `seed` — initial quotes and seed-file parsing.
//! - `config` — crypto/forex presets and `FeedConfig`.
//! - `command` — command payloads exchanged between client and server.
//! - `net` — networking constants and small helpers.
//! - `error` / `result` — unified `FeedError` and `Result` alias.
//!
//! Typical wiring, done once by the application that owns the cache:
//!
//! ```no_run
//! use std::sync::Arc;
//! use price_feed::{FeedConfig, FeedKind, PriceFeedCache};
//!
//! fn main() -> price_feed::Result<()> {
//!     let cache = Arc::new(PriceFeedCache::from_config(&FeedConfig::preset(FeedKind::Crypto))?);
//!     let subscription = cache.subscribe(|snapshot| {
//!         for quote in &snapshot.quotes {
//!             println!("{} {} {}", quote.symbol(), quote.formatted_price(), quote.formatted_change());
//!         }
//!     });
//!     cache.start_auto_refresh()?;
//!     // ...
//!     subscription.unsubscribe();
//!     cache.stop_auto_refresh();
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]
pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod net;
pub mod quote;
pub mod result;
pub mod scheduler;
pub mod seed;
pub mod source;

pub use cache::{PriceFeedCache, RefreshOutcome, Subscription};
pub use command::Command;
pub use config::{FeedConfig, FeedKind};
pub use error::FeedError;
pub use format::PriceFormat;
pub use quote::{PriceUpdate, Quote, Snapshot};
pub use result::Result;
pub use seed::{SeedParser, SeedQuote};
pub use source::{QuoteSource, RandomWalkSource};
