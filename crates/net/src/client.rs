//! Relay client: a background thread owns the connection; the frame loop
//! only ever touches the two queues and the last-known id/connected fields.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::protocol::{decode_payload, encode_payload, ControlMsg};
use crate::NetError;

/// Fixed backoff between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);
/// Depth of each duplex queue; a full queue drops instead of blocking.
pub const QUEUE_DEPTH: usize = 256;
/// How often the pump re-checks the running flag when the socket is quiet.
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Shared fields written by the network thread, read by the frame loop.
/// Reads may be one frame stale; that is fine.
struct Shared {
    running: AtomicBool,
    connected: AtomicBool,
    session_id: Mutex<Option<u64>>,
}

/// Duplex relay connection with reconnect-with-backoff.
///
/// `send` and `poll` never block. Dropping the client (or calling
/// [`RelayClient::shutdown`]) clears the running flag; the background thread
/// observes it at its next yield and exits within one reconnect cycle.
pub struct RelayClient {
    outbound_tx: mpsc::Sender<Value>,
    inbound_rx: mpsc::Receiver<Value>,
    shared: Arc<Shared>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl RelayClient {
    /// Spawn the connection thread. Returns immediately; the id shows up in
    /// [`RelayClient::session_id`] once the server greets us.
    pub fn connect(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        let (outbound_tx, outbound_rx) = mpsc::channel(QUEUE_DEPTH);
        let (inbound_tx, inbound_rx) = mpsc::channel(QUEUE_DEPTH);
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            session_id: Mutex::new(None),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("relay-client".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        log::error!("relay runtime failed to start: {e}");
                        return;
                    }
                };
                rt.block_on(connection_loop(addr, thread_shared, outbound_rx, inbound_tx));
            })
            .ok();

        Self {
            outbound_tx,
            inbound_rx,
            shared,
            handle,
        }
    }

    /// Enqueue a message for the connection thread. Never blocks; a full
    /// queue rejects the message instead.
    pub fn send(&self, message: Value) -> Result<(), NetError> {
        if !self.shared.running.load(Ordering::Relaxed) {
            return Err(NetError::Stopped);
        }
        self.outbound_tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NetError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NetError::Stopped,
        })
    }

    /// Drain every currently-available inbound message without blocking.
    pub fn poll(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(message) = self.inbound_rx.try_recv() {
            out.push(message);
        }
        out
    }

    /// Last id the server assigned us, if any. Stays at the last-known value
    /// across a reconnect until the new assignment arrives.
    pub fn session_id(&self) -> Option<u64> {
        self.shared
            .session_id
            .lock()
            .map(|id| *id)
            .unwrap_or(None)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Relaxed)
    }

    /// Stop retrying and wait for the background thread to wind down.
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connect, pump, back off, repeat — until the running flag clears.
async fn connection_loop(
    addr: String,
    shared: Arc<Shared>,
    mut outbound_rx: mpsc::Receiver<Value>,
    inbound_tx: mpsc::Sender<Value>,
) {
    while shared.running.load(Ordering::Relaxed) {
        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                log::info!("relay connected to {addr}");
                shared.connected.store(true, Ordering::Relaxed);
                if let Err(e) = pump(stream, &shared, &mut outbound_rx, &inbound_tx).await {
                    log::warn!("relay connection lost: {e}");
                }
                shared.connected.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                log::debug!("relay connect to {addr} failed: {e}");
            }
        }
        if shared.running.load(Ordering::Relaxed) {
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

/// Pump one live connection: reader → inbound queue, outbound queue →
/// writer. Returns on socket error, EOF, or shutdown.
async fn pump(
    stream: TcpStream,
    shared: &Shared,
    outbound_rx: &mut mpsc::Receiver<Value>,
    inbound_tx: &mpsc::Sender<Value>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(()); // server closed the stream
                };
                match ControlMsg::decode(&line) {
                    Some(ControlMsg::IdAssignment { id }) => {
                        log::info!("relay assigned session id {id}");
                        if let Ok(mut slot) = shared.session_id.lock() {
                            *slot = Some(id);
                        }
                    }
                    // Peer departures go to the game like any other message.
                    Some(ControlMsg::Disconnect { .. }) | None => {
                        if let Some(value) = decode_payload(&line) {
                            match inbound_tx.try_send(value) {
                                Ok(()) => {}
                                Err(mpsc::error::TrySendError::Full(_)) => {
                                    log::warn!("inbound queue full, dropping message");
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => {
                                    return Ok(()); // client side gone
                                }
                            }
                        }
                    }
                }
            }
            outgoing = outbound_rx.recv() => {
                let Some(message) = outgoing else {
                    return Ok(()); // client side gone
                };
                let mut line = encode_payload(&message);
                line.push('\n');
                write_half.write_all(line.as_bytes()).await?;
            }
            _ = tokio::time::sleep(SHUTDOWN_POLL) => {
                if !shared.running.load(Ordering::Relaxed) {
                    return Ok(());
                }
            }
        }
    }
}
