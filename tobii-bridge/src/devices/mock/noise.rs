//! Randomness behind the simulated tracker's jitter and dropouts

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Per-tracker random source; a non-zero seed replays the same session
pub struct TrackerNoise {
    rng: SmallRng,
}

impl TrackerNoise {
    /// Seed 0 draws from OS entropy
    pub fn new(seed: u64) -> Self {
        let rng = match seed {
            0 => SmallRng::from_entropy(),
            seed => SmallRng::seed_from_u64(seed),
        };
        Self { rng }
    }

    /// Zero-mean offset for a gaze coordinate or head angle
    pub fn jitter(&mut self, stddev: f32) -> f32 {
        if stddev <= 0.0 {
            return 0.0;
        }
        stddev * self.rng.sample::<f32, _>(StandardNormal)
    }

    /// Roll whether a signal is lost this cycle
    pub fn dropped(&mut self, rate: f32) -> bool {
        rate > 0.0 && self.rng.r#gen::<f32>() < rate
    }
}
