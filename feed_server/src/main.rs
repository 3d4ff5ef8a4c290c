//! Price feed streaming server.
//!
//! This binary is the composition root for one `PriceFeedCache`. It seeds the cache
//! from a crypto or forex preset (or a seed file), keeps it refreshing in the
//! background, and streams every new snapshot to subscribed clients over UDP:
//!
//! - `PriceFeedCache` — owns the quotes and refresh cycle; constructed here and shared
//!   through `Arc`, never through a global.
//! - `CommandReceiver` — accepts `SUBSCRIBE` commands over TCP and hands them, with the
//!   client's UDP address, to the main loop.
//! - Per-client stream thread — receives snapshots from a cache subscription, filters
//!   them to the client's symbols and sends them as JSON datagrams.
//! - `UdpPingListener` + `PingMonitor` — keep-alive tracking; a client that stops
//!   pinging is unsubscribed and its stream thread stopped. Pings only count for
//!   clients with an open stream.
//! - A stream thread that dies on a send failure is reported back to the main loop,
//!   which unsubscribes it at once instead of waiting for the ping timeout.
//!
//! Protocol (high level):
//! - Client sends a bincode `Command` with header `SUBSCRIBE`, its UDP port and the
//!   symbols it wants to the TCP command port.
//! - Server streams JSON `Snapshot`s to that UDP address after every refresh.
//! - Client sends `PING` datagrams to the UDP data port at least every few seconds.
#![warn(missing_docs)]
use crate::args::Args;
use crate::model::ping_monitor::PingMonitor;
use crate::receiver::CommandReceiver;
use crate::stream::{forward_snapshots, handle_client_stream};
use crate::udp_listener::UdpPingListener;
use clap::Parser;
use crossbeam_channel::{Sender, select, unbounded};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use price_feed::command::Command;
use price_feed::net::addr;
use price_feed::{PriceFeedCache, Result, Snapshot, Subscription};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod args;
mod model;
mod receiver;
mod stream;
mod udp_listener;

/// A connected client: its cache subscription and the switch for its stream thread.
struct ClientStream {
    id: u64,
    subscription: Subscription,
    stop_tx: Sender<()>,
}

impl ClientStream {
    fn close(self) {
        self.subscription.unsubscribe();
        if self.stop_tx.send(()).is_err() {
            debug!("Stream {} had already finished", self.id);
        }
    }
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let config = args.feed_config()?;
    let cache = Arc::new(PriceFeedCache::from_config(&config)?);
    cache.start_auto_refresh()?;

    let udp_socket = Arc::new(UdpSocket::bind(addr(&args.bind_ip, args.data_port))?);
    info!("UDP socket created on: {}", udp_socket.local_addr()?);

    let ping_monitor = Arc::new(Mutex::new(PingMonitor::new(Duration::from_secs(
        args.ping_timeout_secs,
    ))));
    {
        let socket = Arc::clone(&udp_socket);
        let monitor = Arc::clone(&ping_monitor);
        thread::spawn(move || UdpPingListener::run(socket, monitor));
    }

    let (timeout_tx, timeout_rx) = unbounded::<SocketAddr>();
    {
        let monitor = Arc::clone(&ping_monitor);
        thread::spawn(move || watch_ping_timeouts(monitor, timeout_tx));
    }

    let (cmd_tx, cmd_rx) = unbounded::<(Command, SocketAddr)>();
    let command_receiver = CommandReceiver::new(&addr(&args.bind_ip, args.command_port))?;
    thread::spawn(move || {
        if let Err(e) = command_receiver.receive_loop_with_channel(cmd_tx) {
            error!("Receiver loop failed: {}", e);
        }
    });

    let (closed_tx, closed_rx) = unbounded::<u64>();

    info!("{} feed server ready", cache.kind());
    let mut active_streams: HashMap<SocketAddr, ClientStream> = HashMap::new();
    let mut next_stream_id: u64 = 0;

    loop {
        select! {
            recv(cmd_rx) -> msg => match msg {
                Ok((cmd, target_udp_addr)) => {
                    if let Some(previous) = active_streams.remove(&target_udp_addr) {
                        info!("Replacing stream for {}", target_udp_addr);
                        previous.close();
                    }
                    if cache.is_refresh_due() {
                        cache.refresh();
                    }
                    let client = open_stream(
                        &cache,
                        &udp_socket,
                        next_stream_id,
                        target_udp_addr,
                        cmd.symbols,
                        closed_tx.clone(),
                    );
                    next_stream_id += 1;
                    active_streams.insert(target_udp_addr, client);
                    ping_monitor.lock().register(target_udp_addr);
                    info!("A stream has been created for the client on a UDP address: {}", target_udp_addr);
                }
                Err(e) => {
                    error!("Command channel closed: {}", e);
                    break;
                }
            },

            recv(timeout_rx) -> msg => if let Ok(client_addr) = msg {
                match active_streams.remove(&client_addr) {
                    Some(client) => {
                        client.close();
                        info!("Stream for {} closed: ping timeout", client_addr);
                    }
                    None => warn!("Ping timeout for unknown client {}", client_addr),
                }
            },

            recv(closed_rx) -> msg => if let Ok(stream_id) = msg {
                let client_addr = active_streams
                    .iter()
                    .find(|(_, client)| client.id == stream_id)
                    .map(|(client_addr, _)| *client_addr);
                match client_addr {
                    Some(client_addr) => {
                        if let Some(client) = active_streams.remove(&client_addr) {
                            client.close();
                        }
                        ping_monitor.lock().remove(&client_addr);
                        info!("Stream for {} closed: delivery failed", client_addr);
                    }
                    None => debug!("Stream {} already closed", stream_id),
                }
            }
        }
    }

    for (_, client) in active_streams.drain() {
        client.close();
    }
    cache.stop_auto_refresh();
    Ok(())
}

/// Subscribe a client to the cache and start its stream thread.
fn open_stream(
    cache: &PriceFeedCache,
    socket: &Arc<UdpSocket>,
    id: u64,
    target_addr: SocketAddr,
    symbols: Vec<String>,
    closed_tx: Sender<u64>,
) -> ClientStream {
    let (data_tx, data_rx) = unbounded::<Snapshot>();
    let (stop_tx, stop_rx) = unbounded::<()>();
    let subscription = cache.subscribe(forward_snapshots(id, data_tx, closed_tx));

    let socket = Arc::clone(socket);
    thread::spawn(move || {
        if let Err(e) = handle_client_stream(socket, target_addr, symbols, data_rx, stop_rx) {
            error!("Client stream error: {}", e);
        }
    });

    ClientStream {
        id,
        subscription,
        stop_tx,
    }
}

fn watch_ping_timeouts(ping_monitor: Arc<Mutex<PingMonitor>>, timeout_tx: Sender<SocketAddr>) {
    let check_interval = Duration::from_secs(1);
    loop {
        thread::sleep(check_interval);
        let timed_out_clients = ping_monitor.lock().check_timeouts();
        for client_addr in timed_out_clients {
            if let Err(e) = timeout_tx.send(client_addr) {
                error!("Error sending timeout notification: {}", e);
                return;
            }
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
