//! Ping/keep-alive state tracker for UDP clients.
//!
//! Tracks the last time each client (identified by the `SocketAddr` its snapshots are
//! sent to) was heard from:
//!
//! - `PingMonitor::register(addr)` — start tracking a client when its stream opens.
//! - `PingMonitor::update_ping(addr)` — record a fresh ping from a tracked client. Pings
//!   from anyone else, including clients that already timed out, are ignored.
//! - `PingMonitor::check_timeouts()` — remove and return every client whose last ping is
//!   older than the timeout.
//! - `PingMonitor::remove(addr)` — stop tracking a client whose stream closed.
//!
//! Time is measured with `std::time::Instant`, which is monotonic. The monitor is not
//! synchronized; share it behind a lock.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Tracks client keep-alive pings and determines inactivity based on a timeout.
pub struct PingMonitor {
    last_ping: HashMap<SocketAddr, Instant>,
    timeout: Duration,
}

impl PingMonitor {
    /// Create a monitor that times clients out after `timeout` of silence.
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_ping: HashMap::new(),
            timeout,
        }
    }

    /// Start tracking `addr`, or restart its clock if already tracked.
    pub fn register(&mut self, addr: SocketAddr) {
        self.last_ping.insert(addr, Instant::now());
    }

    /// Record a ping from `addr`. Returns `false` if `addr` is not tracked.
    pub fn update_ping(&mut self, addr: SocketAddr) -> bool {
        match self.last_ping.get_mut(&addr) {
            Some(last) => {
                *last = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Remove and return clients silent for longer than the timeout.
    pub fn check_timeouts(&mut self) -> Vec<SocketAddr> {
        let now = Instant::now();
        let timeout = self.timeout;
        let mut timed_out = Vec::new();

        self.last_ping.retain(|addr, last| {
            if now.duration_since(*last) > timeout {
                timed_out.push(*addr);
                false
            } else {
                true
            }
        });
        timed_out
    }

    /// Stop tracking `addr`. Returns whether it was tracked.
    pub fn remove(&mut self, addr: &SocketAddr) -> bool {
        self.last_ping.remove(addr).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn client(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn silent_clients_time_out_once() {
        let mut monitor = PingMonitor::new(Duration::from_millis(10));
        monitor.register(client(1));

        thread::sleep(Duration::from_millis(30));
        assert_eq!(monitor.check_timeouts(), vec![client(1)]);
        assert!(monitor.check_timeouts().is_empty());
    }

    #[test]
    fn fresh_pings_keep_clients_alive() {
        let mut monitor = PingMonitor::new(Duration::from_millis(200));
        monitor.register(client(1));
        monitor.register(client(2));

        thread::sleep(Duration::from_millis(120));
        assert!(monitor.update_ping(client(1)));
        thread::sleep(Duration::from_millis(120));
        assert_eq!(monitor.check_timeouts(), vec![client(2)]);
        assert!(monitor.update_ping(client(1)));
    }

    #[test]
    fn pings_from_untracked_clients_are_ignored() {
        let mut monitor = PingMonitor::new(Duration::from_millis(10));
        assert!(!monitor.update_ping(client(1)));
        assert!(monitor.check_timeouts().is_empty());

        monitor.register(client(2));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(monitor.check_timeouts(), vec![client(2)]);
        // A late ping must not bring a timed-out client back.
        assert!(!monitor.update_ping(client(2)));
        thread::sleep(Duration::from_millis(30));
        assert!(monitor.check_timeouts().is_empty());
    }

    #[test]
    fn removed_clients_never_time_out() {
        let mut monitor = PingMonitor::new(Duration::from_millis(10));
        monitor.register(client(1));
        assert!(monitor.remove(&client(1)));
        assert!(!monitor.remove(&client(1)));

        thread::sleep(Duration::from_millis(30));
        assert!(monitor.check_timeouts().is_empty());
        assert!(!monitor.update_ping(client(1)));
    }
}
