// core holds the volcano terrain pipeline: outline sampling, triangulation,
// box UV projection, height displacement and lava descent
pub mod config;
pub mod descent;
pub mod displace;
pub mod error;
pub mod geometry;
pub mod influence;
pub mod mesh;
pub mod outline;
pub mod perlin2;
pub mod preview;
pub mod sampler;
pub mod session;
pub mod simplex2;
pub mod triangulate;
pub mod uv;

pub use config::{DisplacementParameters, NoiseKind, SamplerConfig, SessionConfig};
pub use descent::{DescentPath, DescentWalker, FaceAdjacency, Termination};
pub use displace::TerrainDisplacer;
pub use error::{Result, TerrainError};
pub use geometry::{Aabb, BoundingSphere, Ray, RayHit};
pub use influence::{InfluenceSite, InfluenceSiteResolver, Stroke};
pub use mesh::Mesh;
pub use outline::Outline;
pub use perlin2::Perlin2D;
pub use sampler::PolygonSampler;
pub use session::{SessionState, StrokeOutcome, TerrainSession};
pub use simplex2::Simplex2D;
pub use triangulate::{Triangulated, Triangulator};
pub use uv::BoxUvProjector;

// Seeded 2D coherent noise feeding the terrain detail term
pub trait NoiseSource {
    // Sample at (x, y); the result lies in [-1, 1]
    fn sample(&self, x: f64, y: f64) -> f64;
}

impl<F: Fn(f64, f64) -> f64> NoiseSource for F {
    fn sample(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}
