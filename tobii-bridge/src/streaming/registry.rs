//! Registry of connected WebSocket subscribers
//!
//! Each client owns a bounded outbox. The registry only ever `try_send`s into
//! those outboxes, so fan-out never waits on a socket.

use crate::state::ControlState;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Frames queued per client before sends start failing
pub const OUTBOX_CAPACITY: usize = 64;

/// Opaque identity of one WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Sending half of a client outbox
pub type Outbox = Sender<Arc<str>>;

/// Create a client outbox pair
pub fn outbox() -> (Outbox, Receiver<Arc<str>>) {
    bounded(OUTBOX_CAPACITY)
}

struct ClientEntry {
    label: String,
    outbox: Outbox,
}

/// Result of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub attempted: usize,
    pub failed: usize,
}

struct Inner {
    clients: HashMap<ConnectionId, ClientEntry>,
    next_ordinal: u64,
}

/// Connected clients keyed by connection identity
pub struct ClientRegistry {
    inner: Mutex<Inner>,
    control: Arc<ControlState>,
}

impl ClientRegistry {
    pub fn new(control: Arc<ControlState>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                clients: HashMap::new(),
                next_ordinal: 0,
            }),
            control,
        }
    }

    /// Add a client and return its generated `client_<n>` label
    ///
    /// Labels are never reused within a process.
    pub fn register(&self, id: ConnectionId, outbox: Outbox) -> String {
        let mut inner = self.inner.lock();
        let label = format!("client_{}", inner.next_ordinal);
        inner.next_ordinal += 1;
        inner.clients.insert(
            id,
            ClientEntry {
                label: label.clone(),
                outbox,
            },
        );
        self.control.set_client_count(inner.clients.len());
        label
    }

    /// Remove a client; returns its label if it was registered
    pub fn unregister(&self, id: ConnectionId) -> Option<String> {
        let mut inner = self.inner.lock();
        let removed = inner.clients.remove(&id).map(|entry| entry.label);
        self.control.set_client_count(inner.clients.len());
        removed
    }

    pub fn size(&self) -> usize {
        self.inner.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Queue one frame for every registered client
    ///
    /// A full or closed outbox counts as a failure for that client only; the
    /// client stays registered until its session unregisters it.
    pub fn send_to_all(&self, frame: &Arc<str>) -> Delivery {
        let inner = self.inner.lock();
        let mut delivery = Delivery::default();

        for entry in inner.clients.values() {
            delivery.attempted += 1;
            match entry.outbox.try_send(Arc::clone(frame)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    delivery.failed += 1;
                    log::warn!("Outbox full for {}, frame dropped", entry.label);
                }
                Err(TrySendError::Disconnected(_)) => {
                    delivery.failed += 1;
                    log::warn!("Outbox closed for {}, frame dropped", entry.label);
                }
            }
        }

        delivery
    }
}
