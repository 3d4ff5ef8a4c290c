//! Sending commands to the feed server.
//!
//! This module provides a small helper for encoding and sending `Command` messages
//! and for running a background PING loop to keep the subscription alive.
use log::{debug, error, info};
use price_feed::command::Command;
use price_feed::net::PING_MSG;
use price_feed::Result;
use std::io::{ErrorKind, Write};
use std::net::{Shutdown, TcpStream, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

/// PING interval in milliseconds used by the background thread.
const INTERVAL_MS: u64 = 2000;

/// Helper type for sending commands to the server.
pub struct CommandSender;

impl CommandSender {
    /// Encode `command` with bincode and write it to the TCP command stream.
    ///
    /// The write side is shut down afterwards; the server reads the command up to EOF.
    pub fn send_command(stream: &mut TcpStream, command: &Command) -> Result<()> {
        info!(
            "Sending {} udp://{}:{} {}",
            command.header,
            command.address,
            command.port,
            command.symbols.join(",")
        );
        stream.write_all(&command.to_bytes()?)?;
        stream.shutdown(Shutdown::Write)?;
        Ok(())
    }

    /// Spawn a thread that sends `PING` to `target_addr` from `socket` until `shutdown`.
    pub fn start_ping_thread(socket: Arc<UdpSocket>, target_addr: String, shutdown: Arc<AtomicBool>) {
        info!("Ping thread started. Target: {}", target_addr);
        thread::spawn(move || {
            let interval = Duration::from_millis(INTERVAL_MS);
            while !shutdown.load(Ordering::Relaxed) {
                match socket.send_to(PING_MSG, &target_addr) {
                    Ok(_) => debug!("PING sent to {}", target_addr),
                    Err(ref e) if e.kind() == ErrorKind::ConnectionReset => {}
                    Err(e) => error!("Failed to send PING: {}", e),
                }
                thread::sleep(interval);
            }
            info!("Ping thread stopping...");
        });
    }
}
