use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::geometry::{Aabb, BoundingSphere, Ray};
use crate::mesh::Mesh;

// Clearance above the terrain's top when lifting the resolver ray origin
const RAY_LIFT: f32 = 1.0;

/// One user-drawn contour's contribution to the terrain height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfluenceSite {
    /// Centre in UV space.
    pub center: Vec2,
    /// Bounding-sphere radius of the contour stroke.
    pub radius: f32,
}

/// Points of a contour stroke, in the terrain's space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stroke {
    points: Vec<Vec3>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, p: Vec3) {
        self.points.push(p);
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.points)
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::from_points(&self.points)
    }
}

impl FromIterator<Vec3> for Stroke {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

pub struct InfluenceSiteResolver;

impl InfluenceSiteResolver {
    /// Turn a finished contour into an influence site.
    ///
    /// The stroke's bounding-box centre is projected straight down the build
    /// axis onto `terrain`; the UV under it becomes the site centre and the
    /// stroke's bounding-sphere radius the site radius.
    pub fn resolve(stroke: &Stroke, terrain: &Mesh) -> Result<InfluenceSite> {
        if stroke.is_empty() {
            return Err(TerrainError::EmptyStroke);
        }
        if terrain.face_count() == 0 {
            return Err(TerrainError::ProjectionMiss);
        }

        let center = stroke.bounds().center();
        let top = terrain.bounds().max.z.max(center.z) + RAY_LIFT;
        let ray = Ray::new(Vec3::new(center.x, center.y, top), Vec3::NEG_Z);
        let hit = terrain.raycast(&ray).ok_or(TerrainError::ProjectionMiss)?;

        Ok(InfluenceSite {
            center: hit.uv,
            radius: stroke.bounding_sphere().radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uv::BoxUvProjector;

    fn plate() -> Mesh {
        let mut mesh = Mesh::indexed(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        BoxUvProjector::project(&mut mesh);
        mesh
    }

    fn circle(center: Vec2, r: f32) -> Stroke {
        (0..32)
            .map(|i| {
                let a = i as f32 / 32.0 * std::f32::consts::TAU;
                (center + Vec2::new(a.cos(), a.sin()) * r).extend(0.0)
            })
            .collect()
    }

    #[test]
    fn circle_resolves_to_uv_under_its_centre() {
        let site = InfluenceSiteResolver::resolve(&circle(Vec2::new(0.5, -0.5), 0.25), &plate())
            .unwrap();
        assert!((site.center - Vec2::new(0.75, 0.25)).length() < 1e-3);
        assert!((site.radius - 0.25).abs() < 1e-3);
    }

    #[test]
    fn stroke_beside_the_terrain_misses() {
        let err = InfluenceSiteResolver::resolve(&circle(Vec2::new(5.0, 0.0), 0.2), &plate())
            .unwrap_err();
        assert!(matches!(err, TerrainError::ProjectionMiss));
    }

    #[test]
    fn empty_stroke_and_empty_terrain_are_rejected() {
        assert!(matches!(
            InfluenceSiteResolver::resolve(&Stroke::new(), &plate()),
            Err(TerrainError::EmptyStroke)
        ));
        assert!(matches!(
            InfluenceSiteResolver::resolve(&circle(Vec2::ZERO, 0.1), &Mesh::default()),
            Err(TerrainError::ProjectionMiss)
        ));
    }

    #[test]
    fn stroke_below_raised_terrain_still_projects() {
        let mut terrain = plate();
        terrain.positions.iter_mut().for_each(|p| p.z = 2.0);
        terrain.compute_bounds();
        assert!(InfluenceSiteResolver::resolve(&circle(Vec2::ZERO, 0.3), &terrain).is_ok());
    }
}
