//! Box projection UV unwrapping.
//!
//! Each face is projected onto the side of a bounding cube its normal faces
//! most directly. The cube has the mesh's largest extent as its side and sits
//! on the mesh's bounding box centre, so every coordinate lands in [0, 1].
//! UVs are written per face: a vertex shared by faces projected onto
//! different cube sides keeps the UV of the face processed last, which leaves
//! visible seams along those edges.

use glam::{Vec2, Vec3};

use crate::geometry::triangle_normal;
use crate::mesh::Mesh;

/// Cube side a face is flattened onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeSide {
    /// Normal mostly along Y.
    Xz,
    /// Normal mostly along X.
    Zy,
    /// Normal mostly along Z.
    Xy,
}

impl CubeSide {
    /// Ties resolve Y, then X, then Z.
    pub fn for_normal(n: Vec3) -> Self {
        let n = n.abs();
        if n.y >= n.x && n.y >= n.z {
            CubeSide::Xz
        } else if n.x >= n.z {
            CubeSide::Zy
        } else {
            CubeSide::Xy
        }
    }
}

pub struct BoxUvProjector;

impl BoxUvProjector {
    /// Overwrite `mesh.uvs` with a box projection.
    pub fn project(mesh: &mut Mesh) {
        mesh.compute_bounds();
        let bounds = mesh.bounds();
        let size = bounds.max_extent();
        let half = Vec3::splat(size * 0.5);
        let center = bounds.center();
        let (lo, hi) = (center - half, center + half);
        // a single point or an empty mesh has no extent to normalise by
        let inv = if size > 0.0 { 1.0 / size } else { 0.0 };

        let map = |side: CubeSide, v: Vec3| -> Vec2 {
            let uv = match side {
                CubeSide::Xz => Vec2::new(v.x - lo.x, hi.z - v.z),
                CubeSide::Zy => Vec2::new(v.z - lo.z, v.y - lo.y),
                CubeSide::Xy => Vec2::new(v.x - lo.x, v.y - lo.y),
            };
            (uv * inv).clamp(Vec2::ZERO, Vec2::ONE)
        };

        let mut uvs = vec![Vec2::ZERO; mesh.vertex_count()];
        for face in mesh.faces() {
            let [a, b, c] = mesh.face_positions(face);
            let side = CubeSide::for_normal(triangle_normal(a, b, c));
            for (vertex, pos) in face.into_iter().zip([a, b, c]) {
                uvs[vertex as usize] = map(side, pos);
            }
        }
        mesh.uvs = uvs;
        mesh.mark_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_axis_selection() {
        assert_eq!(CubeSide::for_normal(Vec3::new(0.1, -0.9, 0.2)), CubeSide::Xz);
        assert_eq!(CubeSide::for_normal(Vec3::new(-0.8, 0.1, 0.2)), CubeSide::Zy);
        assert_eq!(CubeSide::for_normal(Vec3::new(0.1, 0.1, -0.9)), CubeSide::Xy);
        // ties
        assert_eq!(CubeSide::for_normal(Vec3::new(1.0, 1.0, 1.0)), CubeSide::Xz);
        assert_eq!(CubeSide::for_normal(Vec3::new(1.0, 0.0, 1.0)), CubeSide::Zy);
        assert_eq!(CubeSide::for_normal(Vec3::ZERO), CubeSide::Xz);
    }

    #[test]
    fn flat_plane_maps_xy_over_largest_extent() {
        // 2 wide, 1 tall: the cube side is 2 and y is centred in it
        let mut mesh = Mesh::indexed(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        BoxUvProjector::project(&mut mesh);
        assert_eq!(mesh.uvs.len(), 4);
        assert!((mesh.uvs[0] - Vec2::new(0.0, 0.25)).length() < 1e-6);
        assert!((mesh.uvs[2] - Vec2::new(1.0, 0.75)).length() < 1e-6);
    }

    #[test]
    fn every_uv_is_in_unit_square() {
        // a tent: two slanted faces and one vertical face
        let mut mesh = Mesh::flat(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 2.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, 1.5, 1.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        ]);
        BoxUvProjector::project(&mut mesh);
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y), "{uv}");
        }
    }

    #[test]
    fn shared_vertex_keeps_last_face_uv() {
        // face 0 lies in XY, face 1 in XZ; they share vertex 1
        let mut mesh = Mesh::indexed(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
            ],
            vec![0, 1, 2, 0, 1, 3],
        );
        BoxUvProjector::project(&mut mesh);
        let xz_of_v1 = Vec2::new(1.0, 1.0);
        assert!((mesh.uvs[1] - xz_of_v1).length() < 1e-6);
    }

    #[test]
    fn overwrites_existing_uvs() {
        let mut mesh = Mesh::indexed(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        mesh.uvs = vec![Vec2::splat(9.0); 3];
        mesh.take_changed();
        BoxUvProjector::project(&mut mesh);
        assert!(mesh.uvs.iter().all(|uv| uv.x <= 1.0 && uv.y <= 1.0));
        assert!(mesh.is_changed());
    }
}
