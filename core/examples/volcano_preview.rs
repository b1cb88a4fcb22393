use std::path::Path;

use glam::Vec3;
use volcano_core::preview::{draw_path, render_heightmap};
use volcano_core::{SamplerConfig, SessionConfig, TerrainSession};

// Scripted sketch: a blob outline, two nested contours and a few lava pours,
// rendered top-down to volcano_preview.png
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut session = TerrainSession::new(SessionConfig {
        sampler: SamplerConfig {
            seed: Some(2025),
            ..Default::default()
        },
        noise_seed: Some(2025),
        ..Default::default()
    });

    let ring = |cx: f32, cy: f32, r: f32, wobble: f32| {
        (0..48)
            .map(|i| {
                let a = i as f32 / 48.0 * std::f32::consts::TAU;
                let rr = r * (1.0 + wobble * (3.0 * a).sin());
                (cx + rr * a.cos(), cy + rr * a.sin())
            })
            .collect::<Vec<_>>()
    };

    for pts in [
        ring(0.0, 0.0, 1.5, 0.15),
        ring(0.1, 0.0, 0.9, 0.05),
        ring(0.15, 0.05, 0.4, 0.0),
    ] {
        session.stroke_begin()?;
        for (x, y) in pts {
            session.stroke_point(x, y)?;
        }
        println!("{:?}", session.stroke_end()?);
    }
    session.finalize()?;

    for (x, y) in [(0.9, 0.3), (-0.6, -0.5), (0.2, -1.0)] {
        if let Some(path) = session.surface_click(Vec3::new(x, y, 10.0), Vec3::NEG_Z)? {
            println!("lava from ({x}, {y}): {} faces, {:?}", path.len(), path.termination);
        }
    }

    let Some(mesh) = session.mesh() else {
        return Err("no terrain was generated".into());
    };
    let mut img = render_heightmap(mesh, 768);
    for path in session.lava_flows() {
        draw_path(&mut img, mesh, path);
    }

    let path = Path::new("volcano_preview.png");
    img.save(path)?;
    println!("Saved preview to {:?}", path);
    Ok(())
}
