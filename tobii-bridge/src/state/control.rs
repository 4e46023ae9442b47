//! Process-wide control flags and counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Flags and counters shared by every bridge thread.
///
/// Each field is its own atomic. There is no cross-field consistency:
/// `packets_processed` and `packets_distributed` may be observed mid-cycle.
#[derive(Debug, Default)]
pub struct ControlState {
    connected: AtomicBool,
    recording_enabled: AtomicBool,
    calibrating: AtomicBool,
    packets_processed: AtomicU64,
    packets_distributed: AtomicU64,
    client_count: AtomicU64,
}

/// Point-in-time copy of [`ControlState`] returned to `get-status` queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub connected: bool,
    pub recording: bool,
    pub clients: u64,
    pub packets_processed: u64,
    pub packets_distributed: u64,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_recording(&self) -> bool {
        self.recording_enabled.load(Ordering::Acquire)
    }

    pub fn set_recording(&self, enabled: bool) {
        self.recording_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Acquire)
    }

    pub fn set_calibrating(&self, calibrating: bool) {
        self.calibrating.store(calibrating, Ordering::Release);
    }

    pub fn packets_processed(&self) -> u64 {
        self.packets_processed.load(Ordering::Relaxed)
    }

    pub fn record_processed(&self) {
        self.packets_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packets_distributed(&self) -> u64 {
        self.packets_distributed.load(Ordering::Relaxed)
    }

    pub fn record_distributed(&self) {
        self.packets_distributed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_count(&self) -> u64 {
        self.client_count.load(Ordering::Relaxed)
    }

    /// Mirror the authoritative registry size
    pub fn set_client_count(&self, count: usize) {
        self.client_count.store(count as u64, Ordering::Relaxed);
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            connected: self.is_connected(),
            recording: self.is_recording(),
            clients: self.client_count(),
            packets_processed: self.packets_processed(),
            packets_distributed: self.packets_distributed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        let control = ControlState::new();
        assert_eq!(
            control.status(),
            StatusReport {
                connected: false,
                recording: false,
                clients: 0,
                packets_processed: 0,
                packets_distributed: 0,
            }
        );
        assert!(!control.is_calibrating());
    }

    #[test]
    fn test_counters_and_flags() {
        let control = ControlState::new();
        control.set_connected(true);
        control.set_recording(true);
        control.set_client_count(3);
        control.record_processed();
        control.record_processed();
        control.record_distributed();

        let status = control.status();
        assert!(status.connected);
        assert!(status.recording);
        assert_eq!(status.clients, 3);
        assert_eq!(status.packets_processed, 2);
        assert_eq!(status.packets_distributed, 1);

        control.set_recording(false);
        assert!(!control.status().recording);
    }
}
