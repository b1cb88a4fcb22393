use glam::Vec2;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SamplerConfig;
use crate::error::{Result, TerrainError};
use crate::outline::Outline;

/// Rejection sampler filling an outline with uniformly distributed points.
pub struct PolygonSampler {
    config: SamplerConfig,
    rng: StdRng,
}

impl PolygonSampler {
    pub fn new(config: SamplerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw candidates from the outline's bounding box until `target_count`
    /// of them pass the parity test.
    ///
    /// Misses are retried. A degenerate outline is refused up front and an
    /// outline too thin to ever fill stops with `SamplingExhausted`.
    pub fn sample(&mut self, outline: &Outline) -> Result<Vec<Vec2>> {
        let target = self.config.target_count;
        if outline.is_degenerate() {
            return Err(TerrainError::DegenerateOutline {
                area: outline.area(),
            });
        }
        let Some((lo, hi)) = outline.bounds() else {
            return Err(TerrainError::DegenerateOutline { area: 0.0 });
        };

        let max_attempts = self.config.max_attempts();
        let mut points = Vec::with_capacity(target);
        let mut attempts = 0usize;

        while points.len() < target {
            if attempts >= max_attempts {
                return Err(TerrainError::SamplingExhausted {
                    accepted: points.len(),
                    target,
                    attempts,
                });
            }
            attempts += 1;

            let candidate = Vec2::new(
                self.rng.gen_range(lo.x..hi.x),
                self.rng.gen_range(lo.y..hi.y),
            );
            if outline.contains(candidate) {
                points.push(candidate);
            }
        }

        debug!(
            "sampled {} interior points in {} attempts",
            points.len(),
            attempts
        );
        Ok(points)
    }
}
