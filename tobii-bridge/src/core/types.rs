//! Core data types for tracker readings and the distributed snapshot.
//!
//! Key types:
//! - [`GazePoint`] / [`HeadPose`]: raw readings as returned by a [`TrackingProvider`]
//! - [`SensorSnapshot`]: the normalized reading that is stored and broadcast
//!
//! [`TrackingProvider`]: crate::core::provider::TrackingProvider

/// Confidence assigned to every gaze sample.
///
/// The tracker exposes no confidence metric, so this is a fixed placeholder
/// rather than a measurement.
pub const GAZE_CONFIDENCE: f32 = 0.9;

/// Confidence assigned to every head pose sample (placeholder, see [`GAZE_CONFIDENCE`]).
pub const HEAD_CONFIDENCE: f32 = 0.9;

/// Weight contributed to overall quality when a user is present.
pub const PRESENCE_WEIGHT: f32 = 0.9;

/// Gaze point as reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazePoint {
    /// Normalized screen X
    pub x: f32,
    /// Normalized screen Y
    pub y: f32,
    /// Tracker timestamp
    pub timestamp: u64,
}

/// Head pose as reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// Degrees
    pub yaw: f32,
    /// Degrees
    pub pitch: f32,
    /// Degrees
    pub roll: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Normalized gaze sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    pub x: f32,
    pub y: f32,
    pub timestamp: u64,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl From<GazePoint> for GazeSample {
    fn from(p: GazePoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            timestamp: p.timestamp,
            confidence: GAZE_CONFIDENCE,
        }
    }
}

/// Head position in tracker space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Normalized head pose sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSample {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub position: Position3,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl From<HeadPose> for HeadSample {
    fn from(p: HeadPose) -> Self {
        Self {
            yaw: p.yaw,
            pitch: p.pitch,
            roll: p.roll,
            position: Position3 {
                x: p.x,
                y: p.y,
                z: p.z,
            },
            confidence: HEAD_CONFIDENCE,
        }
    }
}

/// The single canonical reading, replaced wholesale every acquisition cycle.
///
/// Fields are private so `overall_quality` can only be produced by
/// [`SensorSnapshot::new`], which derives it from the other inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    timestamp: u64,
    gaze: Option<GazeSample>,
    head: Option<HeadSample>,
    present: bool,
    overall_quality: f32,
}

impl SensorSnapshot {
    /// Build a snapshot and derive its overall quality
    pub fn new(
        timestamp: u64,
        gaze: Option<GazeSample>,
        head: Option<HeadSample>,
        present: bool,
    ) -> Self {
        Self {
            timestamp,
            gaze,
            head,
            present,
            overall_quality: overall_quality(gaze.as_ref(), head.as_ref(), present),
        }
    }

    /// Normalize raw tracker readings into a snapshot
    pub fn from_readings(
        timestamp: u64,
        gaze: Option<GazePoint>,
        head: Option<HeadPose>,
        present: bool,
    ) -> Self {
        Self::new(
            timestamp,
            gaze.map(GazeSample::from),
            head.map(HeadSample::from),
            present,
        )
    }

    /// Capture time in milliseconds since the Unix epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn gaze(&self) -> Option<&GazeSample> {
        self.gaze.as_ref()
    }

    pub fn head(&self) -> Option<&HeadSample> {
        self.head.as_ref()
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn overall_quality(&self) -> f32 {
        self.overall_quality
    }
}

/// Mean of the available confidence contributors, or 0 when there are none.
///
/// Contributors: gaze confidence, head confidence, and [`PRESENCE_WEIGHT`]
/// when a user is present.
pub fn overall_quality(gaze: Option<&GazeSample>, head: Option<&HeadSample>, present: bool) -> f32 {
    let contributors = [
        gaze.map(|g| g.confidence),
        head.map(|h| h.confidence),
        present.then_some(PRESENCE_WEIGHT),
    ];

    let (sum, count) = contributors
        .iter()
        .flatten()
        .fold((0.0f32, 0u32), |(sum, count), c| (sum + c, count + 1));

    if count > 0 { sum / count as f32 } else { 0.0 }
}

/// Current wall-clock time in milliseconds since the Unix epoch
#[inline]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
