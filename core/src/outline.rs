//! Closed 2D outline drawn by the user, defining the terrain footprint.

use glam::Vec2;

const MIN_SPAN: f32 = 1e-6;
const MIN_AREA: f32 = 1e-9;
// scanlines per band between consecutive vertex heights
const AREA_SUBSTEPS: usize = 16;

/// One or more closed rings in the working plane.
///
/// `move_to` starts a ring, `line_to` appends to it. Every ring is implicitly
/// closed from its last point back to its first; overlapping rings combine
/// under the even-odd rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    rings: Vec<Vec<Vec2>>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single ring through `points`.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut outline = Self::new();
        for (i, p) in points.into_iter().enumerate() {
            if i == 0 {
                outline.move_to(p);
            } else {
                outline.line_to(p);
            }
        }
        outline
    }

    pub fn move_to(&mut self, p: Vec2) {
        match self.rings.last_mut() {
            // a ring that never got a second point is just a pen position
            Some(ring) if ring.len() == 1 => ring[0] = p,
            _ => self.rings.push(vec![p]),
        }
    }

    pub fn line_to(&mut self, p: Vec2) {
        match self.rings.last_mut() {
            Some(ring) => ring.push(p),
            None => self.rings.push(vec![p]),
        }
    }

    pub fn rings(&self) -> &[Vec<Vec2>] {
        &self.rings
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Every edge of every ring, closing edges included.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.rings
            .iter()
            .filter(|ring| ring.len() > 1)
            .flat_map(|ring| {
                ring.iter()
                    .zip(ring.iter().cycle().skip(1))
                    .map(|(a, b)| (*a, *b))
            })
    }

    /// (min, max) corners, `None` for an empty outline.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut points = self.rings.iter().flatten();
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))))
    }

    /// Area enclosed under the even-odd rule, the same rule [`Outline::contains`] uses.
    ///
    /// Integrated with midpoint scanlines between vertex heights. Exact for
    /// simple rings and nested holes; self-intersecting rings are approximated
    /// to within a band of their crossing heights.
    pub fn area(&self) -> f32 {
        let mut heights: Vec<f64> = self
            .rings
            .iter()
            .flatten()
            .map(|p| p.y as f64)
            .collect();
        heights.sort_by(f64::total_cmp);
        heights.dedup();

        let mut area = 0.0;
        for band in heights.windows(2) {
            let step = (band[1] - band[0]) / AREA_SUBSTEPS as f64;
            for k in 0..AREA_SUBSTEPS {
                let y = band[0] + step * (k as f64 + 0.5);
                area += self.inside_width(y) * step;
            }
        }
        area as f32
    }

    // Total length of the even-odd inside intervals along the horizontal line at `y`
    fn inside_width(&self, y: f64) -> f64 {
        let mut xs: Vec<f64> = self
            .edges()
            .filter(|(a, b)| (a.y as f64 > y) != (b.y as f64 > y))
            .map(|(a, b)| {
                let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
                ax + (y - ay) * (bx - ax) / (by - ay)
            })
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.chunks_exact(2).map(|pair| pair[1] - pair[0]).sum()
    }

    /// True when sampling inside this outline could never succeed.
    pub fn is_degenerate(&self) -> bool {
        if self.point_count() < 3 {
            return true;
        }
        match self.bounds() {
            Some((lo, hi)) => {
                let span = hi - lo;
                span.x < MIN_SPAN || span.y < MIN_SPAN || self.area() < MIN_AREA
            }
            None => true,
        }
    }

    /// Ray-parity test: a ray cast from `p` along +X crosses the outline an odd
    /// number of times iff `p` is inside. Points on an edge are not inside.
    pub fn contains(&self, p: Vec2) -> bool {
        let mut crossings = 0usize;
        for (a, b) in self.edges() {
            if on_segment(p, a, b) {
                return false;
            }
            // half-open rule so a vertex on the ray is counted once
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if x > p.x {
                    crossings += 1;
                }
            }
        }
        crossings % 2 == 1
    }
}

fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    (b - a).perp_dot(p - a) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}
