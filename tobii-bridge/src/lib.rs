//! Tobii bridge - real-time gaze and head-pose distribution
//!
//! Polls a tracking provider at a fixed cadence and fans each reading out to:
//!
//! - **WebSocket** (default port 8080): JSON data frames to every client, plus
//!   calibration / recording / status commands answered per client
//! - **Legacy UDP** (default port 4242): 24-byte OpenTrack head-pose datagram
//! - **Discovery** (default port 8083): periodic JSON announcement broadcast

pub mod acquisition;
pub mod bridge;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod state;
pub mod streaming;

// Re-export commonly used types
pub use bridge::{BridgeState, StopHandle, TobiiBridge};
pub use config::BridgeConfig;
pub use crate::core::provider::TrackingProvider;
pub use crate::core::types::{GazePoint, HeadPose, SensorSnapshot};
pub use error::{Error, Result};
