//! WebSocket transport
//!
//! # Threads
//!
//! ```text
//! ws-listener ── accept ──► ws-session (one per client)
//!                              │  1. handshake
//!                              │  2. register outbox in ClientRegistry
//!                              │  3. loop: drain outbox → socket
//!                              │           read (short timeout) → CommandHandler → reply
//!                              └─ 4. unregister on close / error / shutdown
//! ```
//!
//! The acquisition thread never touches a socket: it only queues frames in
//! the per-client outboxes. Replies are written by the session that received
//! the command, so they reach the originating client only.

use crate::error::{Error, Result};
use crate::streaming::commands::CommandHandler;
use crate::streaming::registry::{ClientRegistry, ConnectionId, outbox};
use crossbeam_channel::{Receiver, TryRecvError};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tungstenite::{HandshakeError, Message, WebSocket};

/// Listener sleep when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Session read timeout; bounds outbox latency and shutdown latency
const SESSION_POLL: Duration = Duration::from_millis(5);

/// Overall budget for the HTTP upgrade
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
/// Read timeout while upgrading; bounds shutdown latency during a handshake
const HANDSHAKE_POLL: Duration = Duration::from_millis(50);
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket listener bound at startup
pub struct WebSocketServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    handler: Arc<CommandHandler>,
}

impl WebSocketServer {
    /// Bind the listener; failure is fatal at startup
    pub fn bind(
        addr: SocketAddr,
        registry: Arc<ClientRegistry>,
        handler: Arc<CommandHandler>,
    ) -> Result<Self> {
        let bind_err = |source| Error::Bind {
            transport: "websocket",
            addr,
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        log::info!("WebSocket listening on {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
            registry,
            handler,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept clients until `running` clears, then join every session
    pub fn run(self, running: Arc<AtomicBool>) {
        let mut sessions: Vec<JoinHandle<()>> = Vec::new();
        let mut next_id = 0u64;

        while running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let id = ConnectionId::new(next_id);
                    next_id += 1;

                    let registry = Arc::clone(&self.registry);
                    let handler = Arc::clone(&self.handler);
                    let running = Arc::clone(&running);
                    let spawned = std::thread::Builder::new()
                        .name("ws-session".to_string())
                        .spawn(move || {
                            run_session(id, stream, peer, &registry, &handler, &running)
                        });

                    match spawned {
                        Ok(handle) => sessions.push(handle),
                        Err(e) => log::error!("Failed to spawn session for {}: {}", peer, e),
                    }
                    sessions.retain(|h| !h.is_finished());
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    log::error!("WebSocket accept error: {}", e);
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }

        for handle in sessions {
            if handle.join().is_err() {
                log::error!("WebSocket session thread panicked");
            }
        }
        log::info!("WebSocket listener stopped");
    }
}

/// Complete the upgrade within `HANDSHAKE_TIMEOUT` overall.
///
/// Reads time out every `HANDSHAKE_POLL`, so a client trickling bytes cannot
/// hold the session past the deadline or past shutdown.
fn handshake(stream: TcpStream, running: &AtomicBool) -> Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(HANDSHAKE_POLL))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    let mut attempt = tungstenite::accept(stream);
    loop {
        match attempt {
            Ok(ws) => {
                ws.get_ref().set_read_timeout(Some(SESSION_POLL))?;
                return Ok(ws);
            }
            Err(HandshakeError::Failure(e)) => return Err(Error::from(e)),
            Err(HandshakeError::Interrupted(mid)) => {
                if !running.load(Ordering::Relaxed) {
                    return Err(Error::Other("shutdown during handshake".to_string()));
                }
                if Instant::now() >= deadline {
                    return Err(Error::Io(ErrorKind::TimedOut.into()));
                }
                attempt = mid.handshake();
            }
        }
    }
}

fn run_session(
    id: ConnectionId,
    stream: TcpStream,
    peer: SocketAddr,
    registry: &ClientRegistry,
    handler: &CommandHandler,
    running: &AtomicBool,
) {
    let mut ws = match handshake(stream, running) {
        Ok(ws) => ws,
        Err(e) => {
            log::warn!("Rejected connection from {}: {}", peer, e);
            return;
        }
    };

    let (tx, rx) = outbox();
    let label = registry.register(id, tx);
    log::info!(
        "Client connected: {} from {} ({} total)",
        label,
        peer,
        registry.size()
    );

    let reason = serve(&mut ws, &rx, &label, handler, running);

    registry.unregister(id);
    log::info!(
        "Client disconnected: {} ({}) ({} remaining)",
        label,
        reason,
        registry.size()
    );

    if !running.load(Ordering::Relaxed) {
        let _ = ws.close(None);
        let _ = ws.flush();
    }
}

/// Session loop; returns why the session ended
fn serve(
    ws: &mut WebSocket<TcpStream>,
    rx: &Receiver<Arc<str>>,
    label: &str,
    handler: &CommandHandler,
    running: &AtomicBool,
) -> String {
    while running.load(Ordering::Relaxed) {
        // Outbound frames queued by the broadcaster
        loop {
            match rx.try_recv() {
                Ok(frame) => {
                    if let Err(e) = ws.send(Message::Text(frame.to_string())) {
                        log::warn!("Send to {} failed: {}", label, e);
                        return format!("send failed: {}", e);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return "outbox closed".to_string(),
            }
        }

        // Inbound commands
        match ws.read() {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handler.handle_text(label, &text)
                    && let Err(e) = ws.send(Message::Text(reply))
                {
                    log::warn!("Reply to {} failed: {}", label, e);
                    return format!("send failed: {}", e);
                }
            }
            Ok(Message::Binary(_)) => {
                log::warn!("Dropping binary message from {}", label);
            }
            Ok(Message::Close(_)) => {
                let _ = ws.flush();
                return "closed by peer".to_string();
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return "connection closed".to_string();
            }
            Err(e) => return format!("error: {}", e),
        }
    }

    "shutdown".to_string()
}
