use crate::model::ping_monitor::PingMonitor;
use log::{debug, error};
use parking_lot::Mutex;
use price_feed::net::PING_MSG;
use std::net::UdpSocket;
use std::sync::Arc;

/// Reads UDP datagrams from clients and feeds `PING`s into the `PingMonitor`.
pub struct UdpPingListener;

impl UdpPingListener {
    /// Blocking loop: for each `PING` datagram, refresh the sender in `ping_monitor`.
    /// Pings from clients without an open stream are dropped.
    pub fn run(socket: Arc<UdpSocket>, ping_monitor: Arc<Mutex<PingMonitor>>) {
        let mut buf = [0u8; 128];
        loop {
            match socket.recv_from(&mut buf) {
                Ok((size, addr)) if buf[..size].starts_with(PING_MSG) => {
                    if ping_monitor.lock().update_ping(addr) {
                        debug!("Received ping from {}", addr);
                    } else {
                        debug!("Ignoring ping from untracked client {}", addr);
                    }
                }
                Ok((size, addr)) => debug!("Ignoring {} byte datagram from {}", size, addr),
                Err(e) => error!("Ping socket error: {}", e),
            }
        }
    }
}
