//! Simulated eye tracker for hardware-free operation
//!
//! Produces a smooth, slowly wandering gaze point and a swaying head pose so
//! that clients (and the legacy OpenTrack consumer) can be exercised without a
//! physical tracker attached.
//!
//! # Motion Model
//!
//! | Signal | Model |
//! |--------|-------|
//! | Gaze x/y | Lissajous path around screen centre + Gaussian jitter |
//! | Yaw/pitch/roll | Independent sinusoids (±15°, ±8°, ±3°) |
//! | Head position | Small sway around 600 mm from the display |
//! | Presence | Present unless a dropout fires |
//!
//! Dropouts are configured per signal in `[provider]` and are rolled
//! independently every frame. When nobody is present neither gaze nor head
//! data is produced.

mod noise;

use crate::config::ProviderConfig;
use crate::core::provider::TrackingProvider;
use crate::core::types::{GazePoint, HeadPose, now_ms};
use crate::error::{Error, Result};
use noise::TrackerNoise;
use std::time::Instant;

const GAZE_JITTER: f32 = 0.004;
const HEAD_JITTER_DEG: f32 = 0.2;
const HEAD_DISTANCE_MM: f32 = 600.0;

/// One simulated tracker frame
#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    gaze: Option<GazePoint>,
    head: Option<HeadPose>,
    present: bool,
}

/// Mock tracker driven by a seeded noise generator
pub struct MockTracker {
    config: ProviderConfig,
    noise: Option<TrackerNoise>,
    started: Instant,
    frames: u64,
    current: Frame,
}

impl MockTracker {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            noise: None,
            started: Instant::now(),
            frames: 0,
            current: Frame::default(),
        }
    }

    /// Number of frames produced since initialization
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn simulate(t: f32, noise: &mut TrackerNoise, config: &ProviderConfig) -> Frame {
        if noise.dropped(config.presence_dropout) {
            return Frame::default();
        }

        let gaze = (!noise.dropped(config.gaze_dropout)).then(|| GazePoint {
            x: (0.5 + 0.3 * (0.7 * t).sin() + noise.jitter(GAZE_JITTER)).clamp(0.0, 1.0),
            y: (0.5 + 0.25 * (1.1 * t + 0.5).sin() + noise.jitter(GAZE_JITTER)).clamp(0.0, 1.0),
            timestamp: now_ms(),
        });

        let head = (!noise.dropped(config.head_dropout)).then(|| HeadPose {
            yaw: 15.0 * (0.5 * t).sin() + noise.jitter(HEAD_JITTER_DEG),
            pitch: 8.0 * (0.3 * t).sin() + noise.jitter(HEAD_JITTER_DEG),
            roll: 3.0 * (0.8 * t).sin() + noise.jitter(HEAD_JITTER_DEG),
            x: 20.0 * (0.4 * t).sin(),
            y: 10.0 * (0.6 * t).sin(),
            z: HEAD_DISTANCE_MM + 15.0 * (0.2 * t).sin(),
        });

        Frame {
            gaze,
            head,
            present: true,
        }
    }
}

fn check_probability(name: &str, p: f32) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(Error::ProviderUnavailable(format!(
            "{} must be within [0, 1], got {}",
            name, p
        )))
    }
}

impl TrackingProvider for MockTracker {
    fn initialize(&mut self) -> Result<()> {
        check_probability("presence_dropout", self.config.presence_dropout)?;
        check_probability("gaze_dropout", self.config.gaze_dropout)?;
        check_probability("head_dropout", self.config.head_dropout)?;

        self.noise = Some(TrackerNoise::new(self.config.random_seed));
        self.started = Instant::now();
        self.frames = 0;

        log::info!(
            "Mock tracker initialized (seed: {}, dropouts: presence={}, gaze={}, head={})",
            self.config.random_seed,
            self.config.presence_dropout,
            self.config.gaze_dropout,
            self.config.head_dropout
        );
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let noise = self
            .noise
            .as_mut()
            .ok_or_else(|| Error::ProviderRead("mock tracker not initialized".to_string()))?;

        let t = self.started.elapsed().as_secs_f32();
        self.current = Self::simulate(t, noise, &self.config);
        self.frames += 1;
        Ok(())
    }

    fn latest_gaze_point(&mut self) -> Result<Option<GazePoint>> {
        Ok(self.current.gaze)
    }

    fn latest_head_pose(&mut self) -> Result<Option<HeadPose>> {
        Ok(self.current.head)
    }

    fn is_present(&mut self) -> Result<bool> {
        Ok(self.current.present)
    }

    fn shutdown(&mut self) {
        log::info!("Mock tracker stopped after {} frames", self.frames);
        self.noise = None;
    }
}
