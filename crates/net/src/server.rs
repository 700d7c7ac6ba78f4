//! Relay server: identity tagging plus fan-out, nothing else.
//!
//! Every connection gets a fresh id and an `id_assignment` greeting. After
//! that the server forwards each line it reads to every *other* connected
//! client verbatim — it never parses application payloads and keeps no
//! game state. Departures are broadcast as `disconnect` control messages.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::client::QUEUE_DEPTH;
use crate::protocol::ControlMsg;
use crate::NetError;

type Peers = Arc<Mutex<HashMap<u64, mpsc::Sender<String>>>>;

/// A bound relay ready to serve.
pub struct RelayServer {
    listener: TcpListener,
    peers: Peers,
    next_id: AtomicU64,
}

impl RelayServer {
    pub async fn bind(addr: &str) -> Result<Self, NetError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            peers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; runs until the task is dropped.
    pub async fn serve(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    log::info!("client {id} connected from {addr}");
                    let peers = Arc::clone(&self.peers);
                    tokio::spawn(handle_client(stream, id, peers));
                }
                Err(e) => {
                    log::warn!("accept failed: {e}");
                }
            }
        }
    }
}

/// Send a line to every peer except `from`. A peer with a full or closed
/// queue just misses the message; its own handler cleans it up.
fn broadcast_from(peers: &Peers, from: u64, line: &str) {
    let Ok(peers) = peers.lock() else { return };
    for (&id, tx) in peers.iter() {
        if id != from && tx.try_send(line.to_string()).is_err() {
            log::debug!("client {id} queue unavailable, dropping relay line");
        }
    }
}

async fn handle_client(stream: TcpStream, id: u64, peers: Peers) {
    let (read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<String>(QUEUE_DEPTH);

    // Greeting first, then registration, so the assigned id is always the
    // first line the client sees.
    let _ = tx.try_send(ControlMsg::IdAssignment { id }.encode());
    if let Ok(mut map) = peers.lock() {
        map.insert(id, tx);
    }

    // Writer: drain this peer's queue into its socket.
    let writer = tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            line.push('\n');
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    // Reader: relay every line verbatim to everyone else.
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                broadcast_from(&peers, id, &line);
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("client {id} read error: {e}");
                break;
            }
        }
    }

    // Departure: unregister, then tell everyone who is left.
    if let Ok(mut map) = peers.lock() {
        map.remove(&id);
    }
    broadcast_from(&peers, id, &ControlMsg::Disconnect { id }.encode());
    writer.abort();
    log::info!("client {id} disconnected");
}
