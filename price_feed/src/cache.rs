//! Periodic price-feed cache with subscriber notification.
//!
//! `PriceFeedCache` keeps the latest `Quote` for every seeded symbol, refreshes them
//! from a `QuoteSource` and pushes each new snapshot to its subscribers.
//!
//! Guarantees:
//! - At most one refresh runs at a time. A call made while another is in progress
//!   returns `RefreshOutcome::AlreadyRefreshing` immediately instead of waiting.
//! - A refresh applies and publishes every symbol, or nothing. A failing source, a
//!   batch with a missing symbol or an invalid price leaves the previous snapshot in
//!   place and notifies nobody.
//! - Subscribers are called outside the book and subscriber-list locks, in
//!   subscription order, with an owned `Snapshot`. A panicking subscriber is logged and
//!   skipped; the rest of the cycle proceeds.
//! - Deliveries are serialized: a new subscriber's first call happens on the
//!   subscribing thread before any refresh reaches it, and no subscriber ever sees an
//!   older snapshot after a newer one.
//! - Seeded symbols are never removed.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::config::{FeedConfig, FeedKind};
use crate::error::FeedError;
use crate::quote::{PriceUpdate, Quote, Snapshot, normalize_symbol};
use crate::result::Result;
use crate::scheduler::RefreshTask;
use crate::source::{QuoteSource, RandomWalkSource};

type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// What a call to [`PriceFeedCache::refresh`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New quotes were applied and delivered to subscribers.
    Published,
    /// Another refresh was in progress; nothing happened.
    AlreadyRefreshing,
    /// The source failed or returned an unusable batch; the last snapshot was kept.
    SourceFailed,
}

struct Book {
    quotes: Vec<Quote>,
    index: HashMap<String, usize>,
    last_update: Option<DateTime<Utc>>,
}

impl Book {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            quotes: self.quotes.clone(),
            updated_at: self.last_update,
        }
    }
}

struct Subscriber {
    id: u64,
    callback: Callback,
}

/// Latest quote per symbol, refreshed on demand or on a timer.
pub struct PriceFeedCache {
    kind: FeedKind,
    refresh_interval: Duration,
    book: RwLock<Book>,
    refreshing: AtomicBool,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    // Held while callbacks run. Reentrant so a callback may subscribe.
    delivery: ReentrantMutex<()>,
    next_subscriber_id: AtomicU64,
    source: Box<dyn QuoteSource>,
    auto_refresh: Mutex<Option<RefreshTask>>,
}

impl PriceFeedCache {
    /// Build a cache from `config.seeds`, refreshed by `source`.
    ///
    /// Seeding happens exactly once, here. Symbols are uppercased; an empty seed list,
    /// a duplicate symbol or a non-positive price is rejected.
    pub fn seed<S>(config: &FeedConfig, source: S) -> Result<Self>
    where
        S: QuoteSource + 'static,
    {
        if config.seeds.is_empty() {
            return Err(FeedError::InvalidSeed("no quotes to seed".to_string()));
        }

        let mut quotes = Vec::with_capacity(config.seeds.len());
        let mut index = HashMap::with_capacity(config.seeds.len());
        for seed in &config.seeds {
            let quote = Quote::new(
                &seed.symbol,
                &seed.display_name,
                seed.price,
                seed.change_percent,
                config.format,
            )?;
            if index.insert(quote.symbol().to_string(), quotes.len()).is_some() {
                return Err(FeedError::DuplicateSymbol(quote.symbol().to_string()));
            }
            quotes.push(quote);
        }

        info!(
            "{} feed seeded with {} quotes, refresh every {:?}",
            config.kind,
            quotes.len(),
            config.refresh_interval
        );

        Ok(Self {
            kind: config.kind,
            refresh_interval: config.refresh_interval,
            book: RwLock::new(Book {
                quotes,
                index,
                last_update: None,
            }),
            refreshing: AtomicBool::new(false),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            delivery: ReentrantMutex::new(()),
            next_subscriber_id: AtomicU64::new(0),
            source: Box::new(source),
            auto_refresh: Mutex::new(None),
        })
    }

    /// Build a cache driven by the simulated random-walk source.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::seed(config, RandomWalkSource::new(config.max_move))
    }

    /// Feed this cache serves.
    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Minimum time between refreshes.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Case-insensitive lookup; `None` for a symbol that was never seeded.
    pub fn get_quote(&self, symbol: &str) -> Option<Quote> {
        let book = self.book.read();
        book.index
            .get(&normalize_symbol(symbol))
            .map(|&i| book.quotes[i].clone())
    }

    /// Current raw price for `symbol`, ignoring case.
    pub fn get_price(&self, symbol: &str) -> Option<f64> {
        let book = self.book.read();
        book.index
            .get(&normalize_symbol(symbol))
            .map(|&i| book.quotes[i].raw_price())
    }

    /// Copy of every quote, in seed order.
    pub fn get_all_quotes(&self) -> Vec<Quote> {
        self.book.read().quotes.clone()
    }

    /// Copy of every quote together with the time of the last refresh.
    pub fn snapshot(&self) -> Snapshot {
        self.book.read().snapshot()
    }

    /// Completion time of the most recent successful refresh.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.book.read().last_update
    }

    /// `true` if the cache was never refreshed or the interval has elapsed since.
    pub fn is_refresh_due(&self) -> bool {
        match self.last_update() {
            None => true,
            // A clock that went backwards yields an error here; treat it as not due.
            Some(at) => (Utc::now() - at)
                .to_std()
                .map(|elapsed| elapsed > self.refresh_interval)
                .unwrap_or(false),
        }
    }

    /// `true` while a refresh is running.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Run one refresh cycle: fetch, apply atomically, notify subscribers.
    pub fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            debug!("{} feed: refresh already in progress, skipping", self.kind);
            return RefreshOutcome::AlreadyRefreshing;
        };

        let current = self.get_all_quotes();
        let fetched = panic::catch_unwind(AssertUnwindSafe(|| self.source.fetch(&current)))
            .unwrap_or_else(|panic| Err(FeedError::Source(panic_message(&*panic))));
        let updated = match fetched.and_then(|updates| apply_batch(&current, updates)) {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("{} feed: refresh failed, keeping last snapshot: {}", self.kind, e);
                return RefreshOutcome::SourceFailed;
            }
        };

        let snapshot = {
            let mut book = self.book.write();
            book.quotes = updated;
            book.last_update = Some(Utc::now());
            book.snapshot()
        };
        debug!(
            "{} feed: refreshed {} quotes",
            self.kind,
            snapshot.quotes.len()
        );

        self.notify(&snapshot);
        RefreshOutcome::Published
    }

    /// Register `callback` for every future refresh.
    ///
    /// The callback is also invoked once, synchronously, with the current snapshot
    /// before this returns. Dropping the returned handle does not unsubscribe; call
    /// [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        // A refresh writes the book before it takes the delivery lock, so the snapshot
        // read here is never older than one a pending notify would send.
        let _delivery = self.delivery.lock();
        let snapshot = {
            let mut subscribers = self.subscribers.lock();
            subscribers.push(Subscriber {
                id,
                callback: Arc::clone(&callback),
            });
            self.snapshot()
        };
        debug!("{} feed: subscriber {} added", self.kind, id);
        deliver(id, &callback, &snapshot);

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
            active: AtomicBool::new(true),
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Start refreshing on a background thread: once now, then `refresh_interval` after
    /// each cycle completes.
    ///
    /// Returns `Ok(false)` if a cycle is already running.
    pub fn start_auto_refresh(self: &Arc<Self>) -> Result<bool> {
        let mut slot = self.auto_refresh.lock();
        if slot.as_ref().is_some_and(RefreshTask::is_running) {
            return Ok(false);
        }
        let task = RefreshTask::spawn(
            Arc::downgrade(self),
            self.refresh_interval,
            format!("{}-refresh", self.kind),
        )?;
        *slot = Some(task);
        info!("{} feed: auto-refresh started", self.kind);
        Ok(true)
    }

    /// Stop scheduling further cycles; a refresh already running completes.
    ///
    /// Returns `false` if auto-refresh was not running.
    pub fn stop_auto_refresh(&self) -> bool {
        match self.auto_refresh.lock().take() {
            Some(task) => {
                task.stop();
                info!("{} feed: auto-refresh stopped", self.kind);
                true
            }
            None => false,
        }
    }

    /// `true` while an auto-refresh cycle is scheduled.
    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh
            .lock()
            .as_ref()
            .is_some_and(RefreshTask::is_running)
    }

    fn notify(&self, snapshot: &Snapshot) {
        let _delivery = self.delivery.lock();
        let subscribers: Vec<(u64, Callback)> = self
            .subscribers
            .lock()
            .iter()
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect();
        for (id, callback) in &subscribers {
            deliver(*id, callback, snapshot);
        }
    }
}

/// Handle returned by [`PriceFeedCache::subscribe`].
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Vec<Subscriber>>>,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the callback. Only the first call has an effect; it returns `true`.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().retain(|s| s.id != self.id);
        }
        debug!("subscriber {} removed", self.id);
        true
    }

    /// `true` until [`Subscription::unsubscribe`] is called.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Holds the `refreshing` flag for the duration of one cycle, on every exit path.
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Pair every current quote with its update. Any gap or invalid value fails the batch.
fn apply_batch(current: &[Quote], updates: Vec<PriceUpdate>) -> Result<Vec<Quote>> {
    let mut by_symbol: HashMap<String, PriceUpdate> = updates
        .into_iter()
        .map(|u| (normalize_symbol(&u.symbol), u))
        .collect();

    let quotes = current
        .iter()
        .map(|quote| {
            let update = by_symbol
                .remove(quote.symbol())
                .ok_or_else(|| FeedError::IncompleteBatch(quote.symbol().to_string()))?;
            quote.with_update(update.price, update.change_percent)
        })
        .collect::<Result<Vec<_>>>()?;

    if !by_symbol.is_empty() {
        debug!("ignoring updates for unseeded symbols: {:?}", by_symbol.keys());
    }
    Ok(quotes)
}

fn deliver(id: u64, callback: &Callback, snapshot: &Snapshot) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        error!("subscriber {} panicked: {}", id, panic_message(&*panic));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
