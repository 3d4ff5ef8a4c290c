//! Feed Client — a terminal ticker that subscribes to a feed server and prints every
//! snapshot it receives. It sends a `SUBSCRIBE` command over TCP naming the symbols to
//! watch, keeps the subscription alive with periodic `PING`s over UDP, and renders each
//! incoming snapshot as one line per quote.
//!
//! Usage example (CLI):
//! ```bash
//! feed_client --server-ip 127.0.0.1 --listen-port 55555 --symbols BTC,ETH
//! feed_client --server-ip 127.0.0.1 --path ./symbols.txt
//! ```
#![warn(missing_docs)]
mod args;
mod sender;
mod ticker;

use crate::args::Args;
use crate::sender::CommandSender;
use crate::ticker::{TickerBoard, read_symbols};
use clap::Parser;
use log::{debug, error, info, warn};
use price_feed::command::Command;
use price_feed::net::{COMMAND_PORT, DATA_PORT, addr};
use price_feed::{FeedError, Result, Snapshot};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::net::{TcpStream, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

/// Blocking loop that receives snapshots from `socket` and prints them until `shutdown`.
fn start_receiver_loop(socket: Arc<UdpSocket>, shutdown: Arc<AtomicBool>) -> Result<()> {
    info!("Snapshot receiver running on: {}", socket.local_addr()?);
    let mut buf = vec![0u8; 65536];
    let mut board = TickerBoard::default();

    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            Ok(size) => match serde_json::from_slice::<Snapshot>(&buf[..size]) {
                Ok(snapshot) => match board.accept(&snapshot) {
                    Some(lines) => {
                        for line in lines {
                            info!("{}", line);
                        }
                    }
                    None => debug!("Dropped out-of-order snapshot"),
                },
                Err(e) => debug!("Undecodable datagram ({}): {}", e, String::from_utf8_lossy(&buf[..size])),
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                error!("Receive data error: {}", e);
                return Err(e.into());
            }
        }
    }
    info!("Receiver loop stopping...");
    Ok(())
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| FeedError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let server_ip = args.server_ip.trim().replace('"', "");
    let mut symbols: Vec<String> = args.symbols.iter().map(|s| s.trim().to_uppercase()).collect();
    if let Some(path) = &args.path {
        let file = File::open(path.trim().trim_matches('"'))?;
        for symbol in read_symbols(BufReader::new(file))? {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }
    if symbols.is_empty() {
        info!("No symbols given; watching the whole feed");
    } else {
        info!("Symbols: {:?}", symbols);
    }

    let mut listen_port = args.listen_port;
    if listen_port == DATA_PORT {
        warn!(
            "--listen-port={} matches the server DATA_PORT. A free local port will be selected.",
            listen_port
        );
        listen_port = 0;
    }

    let client_udp_socket = Arc::new(UdpSocket::bind(addr("0.0.0.0", listen_port))?);
    client_udp_socket.set_read_timeout(Some(Duration::from_secs(5)))?;
    let client_local_addr = client_udp_socket.local_addr()?;
    info!("UDP client listening on: {}", client_local_addr);

    let server_command_address = addr(&server_ip, COMMAND_PORT);
    info!("Connecting to TCP server at {}", server_command_address);
    let mut tcp_stream = TcpStream::connect(&server_command_address)
        .map_err(|e| FeedError::Format(format!("Failed to connect to server: {}", e)))?;

    let command = Command::new(
        &client_local_addr.ip().to_string(),
        &client_local_addr.port().to_string(),
        symbols,
    );
    CommandSender::send_command(&mut tcp_stream, &command)?;
    info!("Subscription sent to server {}.", server_command_address);

    CommandSender::start_ping_thread(
        Arc::clone(&client_udp_socket),
        addr(&server_ip, DATA_PORT),
        Arc::clone(&shutdown),
    );

    info!("Client is running. Press Ctrl+C to exit.");
    start_receiver_loop(client_udp_socket, shutdown)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
