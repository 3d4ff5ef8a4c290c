use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use price_feed::command::Command;
use price_feed::{FeedError, Result};
use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

/// Largest command accepted on one connection.
const MAX_COMMAND_BYTES: u64 = 1 << 20;
/// How long a client may take to send its command and close its write side.
const COMMAND_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP command receiver that accepts client subscription requests.
///
/// For each decoded `SUBSCRIBE` command, the receiver emits the command together with
/// the client's UDP `SocketAddr` (TCP peer IP, port from the command) into a channel.
/// A malformed command only drops that connection; the accept loop keeps running.
pub struct CommandReceiver {
    socket: TcpListener,
}

impl CommandReceiver {
    /// Bind a new TCP receiver to `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self { socket })
    }

    /// Blocking accept loop; returns only if the listener itself fails.
    pub fn receive_loop_with_channel(self, tx: Sender<(Command, SocketAddr)>) -> Result<()> {
        info!(
            "Command TCP server is started on {}",
            self.socket.local_addr()?
        );

        for stream in self.socket.incoming() {
            match stream {
                Ok(mut stream) => match read_command(&mut stream) {
                    Ok(Some(entry)) => tx.send(entry)?,
                    Ok(None) => {}
                    Err(e) => warn!("Rejected command: {}", e),
                },
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

/// Read one command from a connection; `None` for anything but a subscription.
///
/// The client sends a single command and then closes its write side, so the whole
/// connection up to EOF is the command.
fn read_command(stream: &mut TcpStream) -> Result<Option<(Command, SocketAddr)>> {
    let client_tcp_addr = stream.peer_addr()?;
    debug!("client_tcp_addr: {:?}", client_tcp_addr);

    stream.set_read_timeout(Some(COMMAND_READ_TIMEOUT))?;
    let mut buf = Vec::new();
    stream.by_ref().take(MAX_COMMAND_BYTES).read_to_end(&mut buf)?;
    let cmd = Command::from_bytes(&buf)?;
    info!("Received command {:?}", cmd);

    if !cmd.is_subscribe() {
        debug!("Ignoring {} on the command channel", cmd.header);
        return Ok(None);
    }

    let port: u16 = cmd
        .port
        .parse()
        .map_err(|e| FeedError::Format(format!("Invalid UDP port in command: {}", e)))?;
    let target_udp_addr = SocketAddr::new(client_tcp_addr.ip(), port);
    Ok(Some((cmd, target_udp_addr)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Write;
    use std::net::Shutdown;
    use std::thread;

    fn send(addr: SocketAddr, bytes: &[u8]) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(bytes).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
    }

    fn spawn_receiver() -> (SocketAddr, crossbeam_channel::Receiver<(Command, SocketAddr)>) {
        let receiver = CommandReceiver::new("127.0.0.1:0").unwrap();
        let addr = receiver.socket.local_addr().unwrap();
        let (tx, rx) = unbounded();
        thread::spawn(move || receiver.receive_loop_with_channel(tx));
        (addr, rx)
    }

    #[test]
    fn forwards_subscriptions_and_survives_garbage() {
        let (addr, rx) = spawn_receiver();

        send(addr, &[0xff, 0xff, 0xff]);

        let cmd = Command::new("127.0.0.1", "40000", vec!["BTC".to_string()]);
        send(addr, &cmd.to_bytes().unwrap());

        let (received, udp_addr) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, cmd);
        assert_eq!(udp_addr.port(), 40000);
    }

    #[test]
    fn reads_commands_larger_than_one_segment() {
        let (addr, rx) = spawn_receiver();

        let symbols: Vec<String> = (0..2_000).map(|i| format!("SYM{:05}", i)).collect();
        let cmd = Command::new("127.0.0.1", "40001", symbols);
        let bytes = cmd.to_bytes().unwrap();
        assert!(bytes.len() > 4096);
        send(addr, &bytes);

        let (received, udp_addr) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received.symbols.len(), 2_000);
        assert_eq!(received, cmd);
        assert_eq!(udp_addr.port(), 40001);
    }
}
