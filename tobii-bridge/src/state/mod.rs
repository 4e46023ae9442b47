//! Shared state between the acquisition, broadcast, and command paths.
//!
//! - [`SnapshotStore`]: latest reading, written by acquisition, read by broadcasters
//! - [`ControlState`]: process-wide flags and counters, each field independently atomic

mod control;
mod snapshot;

pub use control::{ControlState, StatusReport};
pub use snapshot::SnapshotStore;
