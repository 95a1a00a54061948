//! Persistent connection to the player server.
//!
//! A single task owns the whole connect/read/write/reconnect cycle, so there
//! is never more than one reconnect pending and never two live sockets for
//! one session.  Reconnects use a fixed delay with no backoff and no retry
//! limit.  Each connection attempt gets a fresh generation number; every
//! event carries it so the session can discard leftovers from a superseded
//! connection.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened { generation: u64 },
    Closed { generation: u64 },
    Message { generation: u64, raw: String },
}

enum ConnectionEnd {
    /// Socket closed or errored; reconnect.
    Lost,
    /// Command channel closed; the client is going away.
    Shutdown,
}

/// Spawn the connection task.  Inbound lines and lifecycle changes arrive on
/// `event_tx`; pre-encoded outbound messages are taken from `cmd_rx` and
/// framed with a trailing newline.  Messages submitted while disconnected
/// are dropped silently.
pub fn start_client(
    endpoint: String,
    reconnect_delay: Duration,
    event_tx: mpsc::Sender<ConnectionEvent>,
    mut cmd_rx: mpsc::Receiver<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // Reported once; never attempt to connect to a nonsense endpoint.
        if !endpoint_is_plausible(&endpoint) {
            error!("cannot open a channel to '{}': no host:port", endpoint);
            return;
        }

        let mut generation: u64 = 0;

        loop {
            generation += 1;
            match TcpStream::connect(&endpoint).await {
                Ok(stream) => {
                    info!("connected to {} (generation {})", endpoint, generation);
                    if event_tx
                        .send(ConnectionEvent::Opened { generation })
                        .await
                        .is_err()
                    {
                        return;
                    }
                    let end = run_connection(stream, generation, &event_tx, &mut cmd_rx).await;
                    if event_tx
                        .send(ConnectionEvent::Closed { generation })
                        .await
                        .is_err()
                    {
                        return;
                    }
                    if matches!(end, ConnectionEnd::Shutdown) {
                        return;
                    }
                    info!(
                        "disconnected from server, reconnecting in {} ms",
                        reconnect_delay.as_millis()
                    );
                }
                Err(e) => {
                    warn!("connect to {} failed: {}", endpoint, e);
                }
            }

            if let ConnectionEnd::Shutdown = wait_for_retry(reconnect_delay, &mut cmd_rx).await {
                return;
            }
        }
    })
}

async fn run_connection(
    stream: TcpStream,
    generation: u64,
    event_tx: &mpsc::Sender<ConnectionEvent>,
    cmd_rx: &mut mpsc::Receiver<String>,
) -> ConnectionEnd {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(raw)) => {
                    if event_tx
                        .send(ConnectionEvent::Message { generation, raw })
                        .await
                        .is_err()
                    {
                        return ConnectionEnd::Shutdown;
                    }
                }
                Ok(None) => {
                    info!("server closed the connection");
                    return ConnectionEnd::Lost;
                }
                Err(e) => {
                    error!("read error: {}", e);
                    return ConnectionEnd::Lost;
                }
            },
            cmd = cmd_rx.recv() => match cmd {
                Some(msg) => {
                    let mut framed = msg.into_bytes();
                    framed.push(b'\n');
                    if let Err(e) = write_half.write_all(&framed).await {
                        error!("write error: {}", e);
                        return ConnectionEnd::Lost;
                    }
                }
                None => return ConnectionEnd::Shutdown,
            },
        }
    }
}

/// Sleep out the retry delay while draining (and dropping) anything the
/// session tries to send in the meantime.
async fn wait_for_retry(delay: Duration, cmd_rx: &mut mpsc::Receiver<String>) -> ConnectionEnd {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return ConnectionEnd::Lost,
            cmd = cmd_rx.recv() => match cmd {
                Some(msg) => debug!("dropping message while disconnected: {}", msg),
                None => return ConnectionEnd::Shutdown,
            },
        }
    }
}

fn endpoint_is_plausible(endpoint: &str) -> bool {
    match endpoint.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
