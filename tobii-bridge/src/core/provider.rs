//! TrackingProvider trait definition

use crate::core::types::{GazePoint, HeadPose};
use crate::error::Result;

/// Tracker abstraction consumed by the acquisition loop.
///
/// Every reading is treated as independently optional per frame; the bridge
/// never assumes that a value seen in one cycle is still valid in the next.
pub trait TrackingProvider: Send {
    /// Bring up the tracker link.
    ///
    /// Failure here is fatal: the bridge refuses to start.
    fn initialize(&mut self) -> Result<()>;

    /// Advance the tracker by one frame
    fn update(&mut self) -> Result<()>;

    /// Latest gaze point, if the tracker produced one this frame
    fn latest_gaze_point(&mut self) -> Result<Option<GazePoint>>;

    /// Latest head pose, if the tracker produced one this frame
    fn latest_head_pose(&mut self) -> Result<Option<HeadPose>>;

    /// Presence detection result
    fn is_present(&mut self) -> Result<bool>;

    /// Release tracker resources. Called once when acquisition stops.
    fn shutdown(&mut self) {}
}
