use thiserror::Error;

use crate::session::SessionState;

/// Everything the terrain pipeline can fail with.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// The outline encloses no area, sampling it would never terminate.
    #[error("outline is degenerate (enclosed area {area})")]
    DegenerateOutline { area: f32 },

    /// Rejection sampling ran out of attempts before reaching the target.
    #[error("sampling exhausted: {accepted}/{target} points after {attempts} attempts")]
    SamplingExhausted {
        accepted: usize,
        target: usize,
        attempts: usize,
    },

    /// The resolver ray did not hit the terrain.
    #[error("contour centre does not project onto the terrain")]
    ProjectionMiss,

    #[error("contour stroke has no points")]
    EmptyStroke,

    /// The Delaunay backend rejected an input point.
    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("cannot {action} while session is {from:?}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("face {face} out of range (mesh has {faces} faces)")]
    FaceOutOfRange { face: usize, faces: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
