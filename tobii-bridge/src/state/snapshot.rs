//! Latest-reading store

use crate::core::types::SensorSnapshot;
use parking_lot::Mutex;

/// Holds the single most recent [`SensorSnapshot`].
///
/// A write replaces the whole value inside one critical section, so readers
/// observe either the previous or the new snapshot, never a mix. Reads copy
/// the value out; the lock is never held across I/O.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: Mutex<SensorSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot
    pub fn write(&self, snapshot: SensorSnapshot) {
        *self.latest.lock() = snapshot;
    }

    /// Copy of the current snapshot
    pub fn read(&self) -> SensorSnapshot {
        *self.latest.lock()
    }
}
