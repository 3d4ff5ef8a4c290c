//! Per-client snapshot stream.

use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, error};
use price_feed::{Result, Snapshot};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Build the cache callback that feeds one client stream.
///
/// Once the stream thread has exited, the callback reports `stream_id` on `closed_tx`
/// a single time so the owner can unsubscribe it.
pub fn forward_snapshots(
    stream_id: u64,
    data_tx: Sender<Snapshot>,
    closed_tx: Sender<u64>,
) -> impl Fn(&Snapshot) + Send + Sync + 'static {
    let reported = AtomicBool::new(false);
    move |snapshot| {
        if data_tx.send(snapshot.clone()).is_ok() || reported.swap(true, Ordering::Relaxed) {
            return;
        }
        debug!("Stream {} has stopped, dropping snapshot", stream_id);
        if closed_tx.send(stream_id).is_err() {
            debug!("No owner left to close stream {}", stream_id);
        }
    }
}

/// Forward snapshots from `data_rx` to `target_addr` as JSON datagrams.
///
/// Only quotes for `symbols` are sent; an empty list means every symbol. Returns when
/// `stop_rx` fires or either channel closes. A send failure ends the stream with an
/// error so the caller can log it; other clients are unaffected.
pub fn handle_client_stream(
    socket: Arc<UdpSocket>,
    target_addr: SocketAddr,
    symbols: Vec<String>,
    data_rx: Receiver<Snapshot>,
    stop_rx: Receiver<()>,
) -> Result<()> {
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(data_rx) -> msg => match msg {
                Ok(snapshot) => {
                    let outgoing = if symbols.is_empty() {
                        snapshot
                    } else {
                        snapshot.filtered(&symbols)
                    };
                    if outgoing.quotes.is_empty() {
                        continue;
                    }
                    let data = outgoing.to_json_bytes()?;
                    if let Err(e) = socket.send_to(&data, target_addr) {
                        error!("Failed to send UDP packet to {}: {}", target_addr, e);
                        return Err(e.into());
                    }
                }
                Err(_) => break,
            }
        }
    }
    debug!("Stream for {} finished", target_addr);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use price_feed::{FeedConfig, FeedKind, PriceFeedCache};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn sends_only_requested_symbols() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").unwrap());
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let target = client.local_addr().unwrap();

        let cache = PriceFeedCache::from_config(&FeedConfig::preset(FeedKind::Crypto)).unwrap();
        let (data_tx, data_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded();
        let worker = thread::spawn(move || {
            handle_client_stream(server, target, vec!["eth".to_string()], data_rx, stop_rx)
        });

        data_tx.send(cache.snapshot()).unwrap();
        let mut buf = [0u8; 65536];
        let size = client.recv(&mut buf).unwrap();
        let received: Snapshot = serde_json::from_slice(&buf[..size]).unwrap();
        assert_eq!(received.quotes.len(), 1);
        assert_eq!(received.quotes[0].symbol(), "ETH");

        stop_tx.send(()).unwrap();
        assert!(worker.join().unwrap().is_ok());
    }

    #[test]
    fn forwarder_reports_a_stopped_stream_once() {
        let cache = PriceFeedCache::from_config(&FeedConfig::preset(FeedKind::Forex)).unwrap();
        let (data_tx, data_rx) = unbounded();
        let (closed_tx, closed_rx) = unbounded();
        let forward = forward_snapshots(7, data_tx, closed_tx);

        forward(&cache.snapshot());
        assert_eq!(data_rx.try_recv().unwrap(), cache.snapshot());
        assert!(closed_rx.try_recv().is_err());

        drop(data_rx);
        forward(&cache.snapshot());
        forward(&cache.snapshot());
        assert_eq!(closed_rx.try_iter().collect::<Vec<_>>(), vec![7]);
    }
}
