use glam::{Vec2, Vec3};

const RAY_EPSILON: f32 = 1e-7;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point will expand.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.expand(*p);
            b
        })
    }

    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Largest side length.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }
}

/// Sphere centred on the bounding box centre enclosing every point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn from_points(points: &[Vec3]) -> Self {
        let center = Aabb::from_points(points).center();
        let radius = points
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0f32, f32::max)
            .sqrt();
        Self { center, radius }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore, double sided.
    ///
    /// Returns the distance along the ray and the barycentric weights of `b` and `c`.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<(f32, Vec2)> {
        let edge1 = b - a;
        let edge2 = c - a;
        let pvec = self.direction.cross(edge2);
        let det = edge1.dot(pvec);
        if det.abs() < RAY_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = self.origin - a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(edge1);
        let v = self.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(qvec) * inv_det;
        (t >= 0.0).then_some((t, Vec2::new(u, v)))
    }
}

/// Closest intersection of a ray with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub face: usize,
    pub distance: f32,
    pub point: Vec3,
    /// Texture coordinate interpolated from the face corners.
    pub uv: Vec2,
}

pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

pub fn centroid(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (a + b + c) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_tracks_extent() {
        let pts = [Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 1.0, 0.0)];
        let b = Aabb::from_points(&pts);
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, 2.0));
        assert_eq!(b.max_extent(), 4.0);
        assert_eq!(b.center(), Vec3::new(1.0, 0.5, 1.0));
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
    }

    #[test]
    fn bounding_sphere_reaches_farthest_point() {
        let pts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ];
        let s = BoundingSphere::from_points(&pts);
        assert_eq!(s.center, Vec3::ZERO);
        assert!((s.radius - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn ray_hits_triangle_from_either_side() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let down = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let (t, bary) = down.intersect_triangle(a, b, c).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
        assert!((bary - Vec2::new(0.25, 0.25)).length() < 1e-6);

        let up = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);
        assert!(up.intersect_triangle(a, b, c).is_some());
    }

    #[test]
    fn ray_misses_outside_and_behind() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let outside = Ray::new(Vec3::new(0.8, 0.8, 1.0), Vec3::NEG_Z);
        assert!(outside.intersect_triangle(a, b, c).is_none());
        let away = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(away.intersect_triangle(a, b, c).is_none());
        let parallel = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::X);
        assert!(parallel.intersect_triangle(a, b, c).is_none());
    }
}
