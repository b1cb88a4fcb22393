use glam::{Vec2, Vec3};

use crate::geometry::{Aabb, BoundingSphere, Ray, RayHit, centroid, triangle_normal};
use crate::triangulate::Triangulated;

/// Triangle mesh owned by the terrain pipeline.
///
/// Positions are rewritten in place by the displacer; indices and UVs stay
/// fixed once generated. Without an index buffer every three consecutive
/// positions form a face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Option<Vec<u32>>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    bounds: Option<Aabb>,
    sphere: Option<BoundingSphere>,
    changed: bool,
}

impl Mesh {
    pub fn indexed(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            positions,
            indices: Some(indices),
            ..Default::default()
        };
        mesh.compute_bounds();
        mesh.changed = true;
        mesh
    }

    /// Triangle soup, one face per three positions.
    pub fn flat(positions: Vec<Vec3>) -> Self {
        let mut mesh = Self {
            positions,
            ..Default::default()
        };
        mesh.compute_bounds();
        mesh.changed = true;
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Vertex indices of face `i`.
    pub fn face(&self, i: usize) -> [u32; 3] {
        match &self.indices {
            Some(indices) => [indices[3 * i], indices[3 * i + 1], indices[3 * i + 2]],
            None => {
                let base = (3 * i) as u32;
                [base, base + 1, base + 2]
            }
        }
    }

    pub fn faces(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        (0..self.face_count()).map(|i| self.face(i))
    }

    pub fn face_positions(&self, face: [u32; 3]) -> [Vec3; 3] {
        face.map(|i| self.positions[i as usize])
    }

    pub fn face_centroid(&self, face: [u32; 3]) -> Vec3 {
        let [a, b, c] = self.face_positions(face);
        centroid(a, b, c)
    }

    pub fn uv(&self, vertex: u32) -> Vec2 {
        self.uvs.get(vertex as usize).copied().unwrap_or(Vec2::ZERO)
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds.unwrap_or(Aabb::EMPTY)
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.sphere
    }

    pub fn compute_bounds(&mut self) {
        self.bounds = Some(Aabb::from_points(&self.positions));
        self.sphere = (!self.positions.is_empty())
            .then(|| BoundingSphere::from_points(&self.positions));
    }

    /// Area-weighted vertex normals, normalised.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for face in self.faces() {
            let [a, b, c] = self.face_positions(face);
            let n = triangle_normal(a, b, c);
            for i in face {
                normals[i as usize] += n;
            }
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        self.normals = normals;
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read and reset the "geometry changed" flag for the renderer.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Nearest face hit by `ray`, with the face's UV interpolated at the hit.
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for (i, face) in self.faces().enumerate() {
            let [a, b, c] = self.face_positions(face);
            let Some((t, bary)) = ray.intersect_triangle(a, b, c) else {
                continue;
            };
            if best.is_some_and(|hit| hit.distance <= t) {
                continue;
            }
            let [ua, ub, uc] = face.map(|v| self.uv(v));
            let w = 1.0 - bary.x - bary.y;
            best = Some(RayHit {
                face: i,
                distance: t,
                point: ray.at(t),
                uv: ua * w + ub * bary.x + uc * bary.y,
            });
        }
        best
    }
}

impl From<Triangulated> for Mesh {
    fn from(t: Triangulated) -> Self {
        Mesh::indexed(t.positions, t.indices)
    }
}
