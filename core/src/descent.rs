//! Greedy walk across mesh faces towards lower ground, used to trace lava flows.

use std::collections::HashMap;

use glam::Vec3;
use log::warn;

use crate::error::{Result, TerrainError};
use crate::mesh::Mesh;

/// Faces sharing an edge, per face, in ascending face order.
#[derive(Debug, Clone, Default)]
pub struct FaceAdjacency {
    neighbors: Vec<Vec<usize>>,
}

impl FaceAdjacency {
    pub fn build(mesh: &Mesh) -> Self {
        let faces: Vec<[u32; 3]> = mesh.faces().collect();
        let mut by_edge: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (i, face) in faces.iter().enumerate() {
            for k in 0..3 {
                by_edge.entry(edge_key(face[k], face[(k + 1) % 3])).or_default().push(i);
            }
        }

        let neighbors = faces
            .iter()
            .enumerate()
            .map(|(i, face)| {
                let own = sorted(*face);
                let mut list: Vec<usize> = (0..3)
                    .flat_map(|k| &by_edge[&edge_key(face[k], face[(k + 1) % 3])])
                    .copied()
                    // a duplicate of the current face is the current face
                    .filter(|&j| j != i && sorted(faces[j]) != own)
                    .collect();
                list.sort_unstable();
                list.dedup();
                list
            })
            .collect();
        Self { neighbors }
    }

    pub fn neighbors(&self, face: usize) -> &[usize] {
        &self.neighbors[face]
    }

    pub fn face_count(&self) -> usize {
        self.neighbors.len()
    }
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

fn sorted(mut face: [u32; 3]) -> [u32; 3] {
    face.sort_unstable();
    face
}

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No neighbour is strictly lower.
    LocalMinimum,
    /// The step guard ran out first; the path may be incomplete.
    StepLimit,
}

/// Centroids visited by one walk, start first.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentPath {
    pub points: Vec<Vec3>,
    pub faces: Vec<usize>,
    pub termination: Termination,
}

impl DescentPath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.points.last().copied()
    }
}

pub struct DescentWalker<'a> {
    mesh: &'a Mesh,
    adjacency: &'a FaceAdjacency,
}

impl<'a> DescentWalker<'a> {
    /// `adjacency` must have been built from `mesh`'s current index list.
    pub fn new(mesh: &'a Mesh, adjacency: &'a FaceAdjacency) -> Self {
        Self { mesh, adjacency }
    }

    /// Step from `start` to the lowest edge neighbour while it is strictly
    /// lower than the current face.
    ///
    /// Ties between neighbours go to the lowest face index. The walk takes at
    /// most one step per face in the mesh.
    pub fn walk(&self, start: usize) -> Result<DescentPath> {
        let faces = self.mesh.face_count();
        if start >= faces {
            return Err(TerrainError::FaceOutOfRange { face: start, faces });
        }

        let centroid = |f: usize| self.mesh.face_centroid(self.mesh.face(f));
        let mut current = start;
        let mut current_centroid = centroid(current);
        let mut points = Vec::new();
        let mut visited = Vec::new();

        for _ in 0..faces {
            points.push(current_centroid);
            visited.push(current);

            let mut best: Option<(usize, Vec3)> = None;
            for &n in self.adjacency.neighbors(current) {
                let c = centroid(n);
                if best.is_none_or(|(_, b)| c.z < b.z) {
                    best = Some((n, c));
                }
            }

            match best {
                Some((next, c)) if c.z < current_centroid.z => {
                    current = next;
                    current_centroid = c;
                }
                _ => {
                    return Ok(DescentPath {
                        points,
                        faces: visited,
                        termination: Termination::LocalMinimum,
                    });
                }
            }
        }

        warn!(
            "descent from face {start} hit the step guard after {} steps",
            points.len()
        );
        Ok(DescentPath {
            points,
            faces: visited,
            termination: Termination::StepLimit,
        })
    }
}
