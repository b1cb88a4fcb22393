use crate::NoiseSource;
use crate::perlin2::permutation;

// Skew/unskew factors between the square grid and the triangle grid
const SQRT_3: f64 = 1.732_050_807_568_877_2;
const F2: f64 = 0.5 * (SQRT_3 - 1.0);
const G2: f64 = (3.0 - SQRT_3) / 6.0;

const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Single-octave 2D simplex noise, within [-1, 1].
///
/// Cheaper per sample than [`Perlin2D`](crate::Perlin2D) and without its
/// axis-aligned artefacts.
pub struct Simplex2D {
    perm: [u8; 512],
}

impl Simplex2D {
    pub fn new(seed: u64) -> Self {
        Self {
            perm: permutation(seed ^ 0x1234_5678_9ABC_DEF0),
        }
    }

    // Radial falloff kernel of one simplex corner
    #[inline]
    fn corner(&self, gi: usize, x: f64, y: f64) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t <= 0.0 {
            return 0.0;
        }
        let (gx, gy) = GRADIENTS[gi];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }
}

impl NoiseSource for Simplex2D {
    fn sample(&self, x: f64, y: f64) -> f64 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // lower or upper triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let perm = &self.perm;
        let gi0 = perm[ii + perm[jj] as usize] as usize % 12;
        let gi1 = perm[ii + i1 + perm[jj + j1] as usize] as usize % 12;
        let gi2 = perm[ii + 1 + perm[jj + 1] as usize] as usize % 12;

        70.0 * (self.corner(gi0, x0, y0) + self.corner(gi1, x1, y1) + self.corner(gi2, x2, y2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplex2_determinism() {
        let a = Simplex2D::new(9999);
        let b = Simplex2D::new(9999);
        assert_eq!(a.sample(1.23, 4.56), b.sample(1.23, 4.56));
    }

    #[test]
    fn simplex2_range() {
        let s = Simplex2D::new(0);
        for i in 0..500 {
            let v = s.sample(i as f64 * 0.37 - 50.0, i as f64 * 0.11);
            assert!(v.abs() <= 1.0, "{v} out of range");
        }
    }

    #[test]
    fn seeds_differ() {
        let a = Simplex2D::new(1);
        let b = Simplex2D::new(2);
        let differs = (0..50).any(|i| {
            let x = i as f64 * 0.731;
            a.sample(x, -x) != b.sample(x, -x)
        });
        assert!(differs);
    }
}
