//! Volcano height function.
//!
//! Heights are rebuilt from each vertex's UV and XY every time, never from
//! the previous z, so re-running with the same inputs reproduces the mesh.

use glam::{Vec2, Vec3};
use log::debug;

use crate::NoiseSource;
use crate::config::DisplacementParameters;
use crate::influence::InfluenceSite;
use crate::mesh::Mesh;

/// Bump falloff: a site's cone reaches zero at `BUMP_FALLOFF * radius` in UV space.
pub const BUMP_FALLOFF: f32 = 0.38;
/// Crater falloff slope in UV space.
pub const CRATER_FALLOFF: f32 = 3.7;
const DETAIL_FREQUENCY: f64 = 20.0;
const DETAIL_DAMPING: f64 = 85.0;

pub struct TerrainDisplacer<'a> {
    noise: &'a dyn NoiseSource,
}

impl<'a> TerrainDisplacer<'a> {
    pub fn new(noise: &'a dyn NoiseSource) -> Self {
        Self { noise }
    }

    /// Sum of the sites' cone contributions at `uv`.
    pub fn bump(uv: Vec2, sites: &[InfluenceSite]) -> f32 {
        sites
            .iter()
            .map(|site| {
                let reach = BUMP_FALLOFF * site.radius;
                if reach <= 0.0 {
                    return 0.0;
                }
                (1.0 - uv.distance(site.center) / reach).max(0.0)
            })
            .sum()
    }

    /// Sum of the sites' crater contributions at `uv`.
    pub fn crater(uv: Vec2, sites: &[InfluenceSite], crater_size: f32) -> f32 {
        sites
            .iter()
            .map(|site| (1.0 - uv.distance(site.center) * CRATER_FALLOFF - crater_size).max(0.0))
            .sum()
    }

    /// Fractal noise over frequencies `1..octaves`.
    pub fn detail(&self, position: Vec3, octaves: u32) -> f32 {
        let (x, y) = (position.x as f64, position.y as f64);
        let mut elevation = 0.0;
        for f in 1..octaves {
            let scale = f as f64 * DETAIL_FREQUENCY;
            elevation += self.noise.sample(x * scale, y * scale) / DETAIL_DAMPING;
        }
        elevation as f32
    }

    /// Height of one vertex.
    pub fn height(
        &self,
        position: Vec3,
        uv: Vec2,
        sites: &[InfluenceSite],
        params: &DisplacementParameters,
    ) -> f32 {
        let bump = Self::bump(uv, sites);
        let crater = Self::crater(uv, sites, params.crater_size);
        // halfway between the raised cone and the sunken crater
        let blended = bump + (-crater * params.crater_depth - bump) * 0.5;
        let detail = if params.detail_scale == 0.0 {
            0.0
        } else {
            self.detail(position, params.octaves)
        };
        blended * params.height_scale + detail * params.detail_scale
    }

    /// Rewrite every vertex z, then refresh bounds and normals and flag the
    /// mesh as changed.
    pub fn apply(&self, mesh: &mut Mesh, sites: &[InfluenceSite], params: &DisplacementParameters) {
        for i in 0..mesh.positions.len() {
            let uv = mesh.uv(i as u32);
            let position = mesh.positions[i];
            mesh.positions[i].z = self.height(position, uv, sites, params);
        }
        mesh.compute_bounds();
        mesh.compute_vertex_normals();
        mesh.mark_changed();
        debug!(
            "displaced {} vertices with {} influence sites",
            mesh.vertex_count(),
            sites.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Perlin2D;

    fn site(x: f32, y: f32, radius: f32) -> InfluenceSite {
        InfluenceSite {
            center: Vec2::new(x, y),
            radius,
        }
    }

    fn grid(n: usize) -> Mesh {
        let mut positions = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let s = 1.0 / (n - 1) as f32;
                positions.push(Vec3::new(i as f32 * s, j as f32 * s, 0.0));
            }
        }
        let mut indices = Vec::new();
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let a = (j * n + i) as u32;
                let b = a + 1;
                let c = a + n as u32;
                indices.extend([a, b, c + 1, a, c + 1, c]);
            }
        }
        let mut mesh = Mesh::indexed(positions, indices);
        mesh.uvs = mesh.positions.iter().map(|p| p.truncate()).collect();
        mesh
    }

    #[test]
    fn bump_is_a_cone() {
        let sites = [site(0.5, 0.5, 1.0)];
        assert_eq!(TerrainDisplacer::bump(Vec2::new(0.5, 0.5), &sites), 1.0);
        let half = TerrainDisplacer::bump(Vec2::new(0.5 + 0.19, 0.5), &sites);
        assert!((half - 0.5).abs() < 1e-5);
        assert_eq!(TerrainDisplacer::bump(Vec2::new(0.0, 0.0), &sites), 0.0);
    }

    #[test]
    fn zero_radius_site_has_no_bump() {
        assert_eq!(TerrainDisplacer::bump(Vec2::ZERO, &[site(0.0, 0.0, 0.0)]), 0.0);
    }

    #[test]
    fn crater_shrinks_with_size() {
        let sites = [site(0.5, 0.5, 0.3)];
        let c = Vec2::new(0.5, 0.5);
        assert_eq!(TerrainDisplacer::crater(c, &sites, 0.0), 1.0);
        assert!((TerrainDisplacer::crater(c, &sites, 0.7) - 0.3).abs() < 1e-6);
        assert_eq!(TerrainDisplacer::crater(c, &sites, 1.5), 0.0);
    }

    #[test]
    fn apply_is_idempotent() {
        let noise = Perlin2D::new(11);
        let displacer = TerrainDisplacer::new(&noise);
        let sites = [site(0.4, 0.5, 0.8), site(0.7, 0.3, 0.4)];
        let params = DisplacementParameters::default();
        let mut mesh = grid(12);
        displacer.apply(&mut mesh, &sites, &params);
        let first: Vec<f32> = mesh.positions.iter().map(|p| p.z).collect();
        displacer.apply(&mut mesh, &sites, &params);
        let second: Vec<f32> = mesh.positions.iter().map(|p| p.z).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn no_sites_and_no_detail_is_flat() {
        let noise = Perlin2D::new(5);
        let params = DisplacementParameters {
            detail_scale: 0.0,
            ..Default::default()
        };
        let mut mesh = grid(8);
        mesh.positions.iter_mut().for_each(|p| p.z = 4.0);
        TerrainDisplacer::new(&noise).apply(&mut mesh, &[], &params);
        assert!(mesh.positions.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn single_octave_has_no_detail() {
        let noise = Perlin2D::new(5);
        let d = TerrainDisplacer::new(&noise).detail(Vec3::new(0.123, 0.456, 0.0), 1);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn apply_refreshes_bounds_and_flag() {
        let noise = Perlin2D::new(5);
        let params = DisplacementParameters {
            detail_scale: 0.0,
            crater_depth: 0.0,
            ..Default::default()
        };
        let mut mesh = grid(9);
        mesh.take_changed();
        TerrainDisplacer::new(&noise).apply(&mut mesh, &[site(0.5, 0.5, 2.0)], &params);
        assert!(mesh.is_changed());
        assert!((mesh.bounds().max.z - 0.5).abs() < 1e-6);
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
    }
}
