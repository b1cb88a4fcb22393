use serde::{Deserialize, Serialize};

use crate::error::Result;

// Debug-panel ranges
const HEIGHT_RANGE: (f32, f32) = (0.01, 3.0);
const DETAIL_RANGE: (f32, f32) = (0.0, 10.0);
const CRATER_SIZE_RANGE: (f32, f32) = (0.0, 3.0);
const CRATER_DEPTH_RANGE: (f32, f32) = (0.0, 3.0);
const OCTAVE_RANGE: (u32, u32) = (1, 8);

/// Global scalars driving the height function.
///
/// Changing any of them requires the displacer to run again over the whole mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementParameters {
    pub height_scale: f32,
    /// Weight of the noise detail term.
    pub detail_scale: f32,
    pub crater_size: f32,
    pub crater_depth: f32,
    /// The detail sum runs over frequencies `1..octaves`.
    pub octaves: u32,
}

impl Default for DisplacementParameters {
    fn default() -> Self {
        Self {
            height_scale: 1.0,
            detail_scale: 2.7,
            crater_size: 0.7,
            crater_depth: 1.0,
            octaves: 3,
        }
    }
}

impl DisplacementParameters {
    /// Copy with every field forced into the range the parameter panel allows.
    pub fn clamped(&self) -> Self {
        Self {
            height_scale: self.height_scale.clamp(HEIGHT_RANGE.0, HEIGHT_RANGE.1),
            detail_scale: self.detail_scale.clamp(DETAIL_RANGE.0, DETAIL_RANGE.1),
            crater_size: self
                .crater_size
                .clamp(CRATER_SIZE_RANGE.0, CRATER_SIZE_RANGE.1),
            crater_depth: self
                .crater_depth
                .clamp(CRATER_DEPTH_RANGE.0, CRATER_DEPTH_RANGE.1),
            octaves: self.octaves.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1),
        }
    }
}

/// Rejection sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of interior points to collect.
    pub target_count: usize,
    /// Attempt budget per requested point before giving up.
    pub max_attempts_per_point: usize,
    /// Fixed seed, or `None` to seed from entropy.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_count: 3000,
            max_attempts_per_point: 1000,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn max_attempts(&self) -> usize {
        self.target_count
            .saturating_mul(self.max_attempts_per_point)
            .max(1)
    }
}

/// Which coherent noise backs the detail term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseKind {
    #[default]
    Perlin,
    Simplex,
}

/// Everything a [`TerrainSession`](crate::TerrainSession) needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sampler: SamplerConfig,
    pub displacement: DisplacementParameters,
    pub noise: NoiseKind,
    /// Seed for the noise permutation, `None` reseeds every session.
    pub noise_seed: Option<u64>,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        Ok(Self {
            displacement: config.displacement.clamped(),
            ..config
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_panel_start_values() {
        let p = DisplacementParameters::default();
        assert_eq!(p.height_scale, 1.0);
        assert_eq!(p.detail_scale, 2.7);
        assert_eq!(p.crater_size, 0.7);
        assert_eq!(p.crater_depth, 1.0);
        assert_eq!(p.octaves, 3);
        assert_eq!(p, p.clamped());
    }

    #[test]
    fn clamped_bounds_every_field() {
        let p = DisplacementParameters {
            height_scale: 0.0,
            detail_scale: 50.0,
            crater_size: -1.0,
            crater_depth: 9.0,
            octaves: 0,
        }
        .clamped();
        assert_eq!(p.height_scale, 0.01);
        assert_eq!(p.detail_scale, 10.0);
        assert_eq!(p.crater_size, 0.0);
        assert_eq!(p.crater_depth, 3.0);
        assert_eq!(p.octaves, 1);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = SessionConfig::from_json_str(
            r#"{ "sampler": { "target_count": 200 }, "noise": "Simplex" }"#,
        )
        .unwrap();
        assert_eq!(cfg.sampler.target_count, 200);
        assert_eq!(cfg.sampler.max_attempts_per_point, 1000);
        assert_eq!(cfg.noise, NoiseKind::Simplex);
        assert_eq!(cfg.displacement, DisplacementParameters::default());
    }

    #[test]
    fn json_roundtrip_keeps_seed() {
        let mut cfg = SessionConfig::default();
        cfg.noise_seed = Some(2025);
        let text = cfg.to_json_string().unwrap();
        let back = SessionConfig::from_json_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SessionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::TerrainError::Config(_)));
    }
}
