//! Fixed-delay refresh task.
//!
//! A `RefreshTask` owns a worker thread that refreshes a cache, then waits for the
//! interval, then refreshes again. The wait starts when a cycle completes, so a slow
//! refresh pushes the next one back instead of overlapping it. The worker only holds a
//! `Weak` reference and exits once the cache is gone.
//!
//! Stopping is cooperative: `stop` (or dropping the handle) ends the wait early, but a
//! refresh that has already started runs to completion.

use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::debug;

use crate::cache::PriceFeedCache;
use crate::error::FeedError;
use crate::result::Result;

/// Handle to a running refresh loop.
pub struct RefreshTask {
    stop_tx: Sender<()>,
    worker: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawn a named worker that refreshes `cache` every `interval`, starting now.
    pub fn spawn(cache: Weak<PriceFeedCache>, interval: Duration, name: String) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || run_cycles(cache, interval, stop_rx))
            .map_err(|e| FeedError::Spawn(e.to_string()))?;
        Ok(Self { stop_tx, worker })
    }

    /// `true` until the worker thread has exited.
    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Ask the worker to exit after its current cycle. Repeated calls are harmless.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_cycles(cache: Weak<PriceFeedCache>, interval: Duration, stop_rx: Receiver<()>) {
    loop {
        match cache.upgrade() {
            Some(cache) => {
                let outcome = cache.refresh();
                debug!("{} feed: scheduled refresh -> {:?}", cache.kind(), outcome);
            }
            None => break,
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("refresh worker exiting");
}
