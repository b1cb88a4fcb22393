use glam::{Vec2, Vec3};
use log::debug;
use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{Result, TerrainError};

/// Flat triangulated surface: positions in the z = 0 plane plus a triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulated {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Delaunay triangulation of sampled points.
pub struct Triangulator;

impl Triangulator {
    /// Triangulate the (x, y) projection of `points`.
    ///
    /// The backend's vertex order is the position order, so every index refers
    /// straight into `positions`. Points the backend merges as duplicates are
    /// dropped from `positions`; all indices stay below `positions.len()`.
    pub fn triangulate(points: &[Vec2]) -> Result<Triangulated> {
        let mut delaunay: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        for p in points {
            delaunay
                .insert(Point2::new(p.x as f64, p.y as f64))
                .map_err(|e| TerrainError::Triangulation(format!("{e:?} at {p}")))?;
        }

        let positions: Vec<Vec3> = delaunay
            .vertices()
            .map(|v| {
                let p = v.position();
                Vec3::new(p.x as f32, p.y as f32, 0.0)
            })
            .collect();

        let mut indices = Vec::with_capacity(delaunay.num_inner_faces() * 3);
        for face in delaunay.inner_faces() {
            for v in face.vertices() {
                let handle: FixedVertexHandle = v.fix();
                indices.push(handle.index() as u32);
            }
        }

        debug!(
            "triangulated {} points into {} faces",
            positions.len(),
            indices.len() / 3
        );
        Ok(Triangulated { positions, indices })
    }
}
