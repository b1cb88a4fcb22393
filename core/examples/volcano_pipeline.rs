use std::time::Instant;

use glam::Vec2;
use volcano_core::{
    BoxUvProjector, DescentWalker, DisplacementParameters, FaceAdjacency, InfluenceSite, Mesh,
    Outline, Perlin2D, PolygonSampler, SessionConfig, TerrainDisplacer, Termination, Triangulator,
};

// Runs each pipeline stage by hand and prints timings and mesh stats.
// Pass a JSON config path as the first argument to override the defaults.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    println!("{}", config.to_json_string()?);

    // L-shaped island
    let outline = Outline::from_points([
        Vec2::new(0.0, 0.0),
        Vec2::new(3.0, 0.0),
        Vec2::new(3.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 3.0),
        Vec2::new(0.0, 3.0),
    ]);
    println!("outline area {:.2}", outline.area());

    let t = Instant::now();
    let points = PolygonSampler::new(config.sampler).sample(&outline)?;
    println!("sampled {} points in {:?}", points.len(), t.elapsed());

    let t = Instant::now();
    let mut mesh = Mesh::from(Triangulator::triangulate(&points)?);
    BoxUvProjector::project(&mut mesh);
    println!("{} faces, uv-projected in {:?}", mesh.face_count(), t.elapsed());

    let sites = [
        InfluenceSite {
            center: Vec2::new(0.2, 0.2),
            radius: 1.2,
        },
        InfluenceSite {
            center: Vec2::new(0.7, 0.15),
            radius: 0.4,
        },
    ];
    let noise = Perlin2D::new(config.noise_seed.unwrap_or(2025));
    let params = DisplacementParameters {
        crater_depth: 0.6,
        ..config.displacement.clamped()
    };
    let t = Instant::now();
    TerrainDisplacer::new(&noise).apply(&mut mesh, &sites, &params);
    let bounds = mesh.bounds();
    println!(
        "displaced in {:?}: z in [{:.3}, {:.3}]",
        t.elapsed(),
        bounds.min.z,
        bounds.max.z
    );

    let adjacency = FaceAdjacency::build(&mesh);
    let walker = DescentWalker::new(&mesh, &adjacency);
    let t = Instant::now();
    let (mut minima, mut longest) = (0, 0);
    for face in 0..mesh.face_count() {
        let path = walker.walk(face)?;
        if path.termination == Termination::LocalMinimum && path.len() == 1 {
            minima += 1;
        }
        longest = longest.max(path.len());
    }
    println!(
        "walked from every face in {:?}: {minima} local minima, longest flow {longest}",
        t.elapsed()
    );
    Ok(())
}
