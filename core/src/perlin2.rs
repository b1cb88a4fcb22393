use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::NoiseSource;

/// Shuffled 0..=255, stored twice so `perm[i + 1]` never needs a wrap.
pub(crate) fn permutation(seed: u64) -> [u8; 512] {
    let mut p: Vec<u8> = (0..=255).collect();
    p.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut perm = [0u8; 512];
    for (i, slot) in perm.iter_mut().enumerate() {
        *slot = p[i & 255];
    }
    perm
}

/// Single-octave 2D Perlin gradient noise.
///
/// Zero on every integer lattice point, roughly within [-1, 1] elsewhere.
pub struct Perlin2D {
    seed: u64,
    perm: [u8; 512],
}

impl Perlin2D {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            perm: permutation(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // 6t^5 - 15t^4 + 10t^3, flat first and second derivative at 0 and 1
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    // Low 3 bits pick one of the 8 directions (±1, ±1), (±1, 0), (0, ±1)
    #[inline]
    fn grad(hash: u8, x: f64, y: f64) -> f64 {
        match hash & 7 {
            0 => x + y,
            1 => -x + y,
            2 => x - y,
            3 => -x - y,
            4 => x,
            5 => -x,
            6 => y,
            _ => -y,
        }
    }

    #[inline]
    fn hash(&self, xi: usize, yi: usize) -> u8 {
        self.perm[self.perm[xi] as usize + yi]
    }
}

impl NoiseSource for Perlin2D {
    fn sample(&self, x: f64, y: f64) -> f64 {
        let (x0, y0) = (x.floor(), y.floor());
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;
        let (xf, yf) = (x - x0, y - y0);
        let (u, v) = (Self::fade(xf), Self::fade(yf));

        let bottom = Self::lerp(
            Self::grad(self.hash(xi, yi), xf, yf),
            Self::grad(self.hash(xi + 1, yi), xf - 1.0, yf),
            u,
        );
        let top = Self::lerp(
            Self::grad(self.hash(xi, yi + 1), xf, yf - 1.0),
            Self::grad(self.hash(xi + 1, yi + 1), xf - 1.0, yf - 1.0),
            u,
        );
        Self::lerp(bottom, top, v)
    }
}
