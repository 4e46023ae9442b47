//! Per-cycle fan-out of the latest snapshot to WebSocket clients

use crate::state::{ControlState, SnapshotStore};
use crate::streaming::registry::{ClientRegistry, Delivery};
use crate::streaming::wire::encode_data_frame;
use std::sync::Arc;

/// Pushes the current snapshot to every registered client
pub struct MessageBroadcaster {
    snapshot: Arc<SnapshotStore>,
    registry: Arc<ClientRegistry>,
    control: Arc<ControlState>,
}

impl MessageBroadcaster {
    pub fn new(
        snapshot: Arc<SnapshotStore>,
        registry: Arc<ClientRegistry>,
        control: Arc<ControlState>,
    ) -> Self {
        Self {
            snapshot,
            registry,
            control,
        }
    }

    /// Broadcast the current snapshot once.
    ///
    /// No-op without clients. Otherwise the frame is encoded once and queued
    /// for every client, and `packets_distributed` is bumped once regardless
    /// of how many clients failed.
    pub fn broadcast(&self) -> Delivery {
        // Snapshot lock is released before the registry lock is taken
        let snapshot = self.snapshot.read();

        if self.registry.is_empty() {
            return Delivery::default();
        }

        let frame = match encode_data_frame(&snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Failed to encode data frame: {}", e);
                return Delivery::default();
            }
        };

        let delivery = self.registry.send_to_all(&frame);
        if delivery.attempted > 0 {
            self.control.record_distributed();
        }
        if delivery.failed > 0 {
            log::debug!(
                "Frame {} reached {}/{} clients",
                snapshot.timestamp(),
                delivery.attempted - delivery.failed,
                delivery.attempted
            );
        }
        delivery
    }
}
