//! Top-down raster preview of a displaced mesh.
//!
//! Faces are scan-converted in XY, coloured by height through a lava-rock
//! gradient and lit with a fixed directional light from the vertex normals.

use glam::{Vec2, Vec3};
use image::{Rgb, RgbImage};
use palette::{Gradient, LinSrgb};

use crate::descent::DescentPath;
use crate::mesh::Mesh;

const BACKGROUND: Rgb<u8> = Rgb([168, 168, 168]);
const LAVA: Rgb<u8> = Rgb([255, 96, 0]);
const AMBIENT: f32 = 0.35;

/// Lava-rock colour ramp over normalised height.
pub struct HeightPalette {
    gradient: Gradient<LinSrgb>,
}

impl HeightPalette {
    pub fn new() -> Self {
        Self {
            gradient: Gradient::with_domain(vec![
                (0.00, LinSrgb::new(0.05, 0.05, 0.08)), // crater floor
                (0.35, LinSrgb::new(0.25, 0.2, 0.18)),  // ash
                (0.70, LinSrgb::new(0.45, 0.33, 0.25)), // rock
                (1.00, LinSrgb::new(0.85, 0.8, 0.75)),  // rim
            ]),
        }
    }

    /// 8-bit colour for `t` in [0, 1]; out-of-range values are clamped.
    pub fn rgb(&self, t: f32) -> [u8; 3] {
        let col: LinSrgb = self.gradient.get(t.clamp(0.0, 1.0));
        let rgb = col.into_format::<u8>();
        [rgb.red, rgb.green, rgb.blue]
    }

    /// Colour for a height inside `[z_min, z_min + z_range]`; a flat range maps to mid-ramp.
    pub fn rgb_for_height(&self, z: f32, z_min: f32, z_range: f32) -> [u8; 3] {
        let t = if z_range > 0.0 { (z - z_min) / z_range } else { 0.5 };
        self.rgb(t)
    }
}

impl Default for HeightPalette {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixel mapping between the mesh's XY footprint and the image.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    origin: Vec2,
    scale: f32,
    height: u32,
}

impl Viewport {
    /// Fit the mesh footprint into a `size`×`size` image, keeping aspect.
    pub fn fit(mesh: &Mesh, size: u32) -> Self {
        let bounds = mesh.bounds();
        let extent = bounds.size().truncate().max_element();
        let scale = if extent > 0.0 {
            (size.saturating_sub(1)) as f32 / extent
        } else {
            1.0
        };
        let origin = if bounds.is_empty() {
            Vec2::ZERO
        } else {
            bounds.min.truncate()
        };
        Self {
            origin,
            scale,
            height: size,
        }
    }

    /// Image coordinates of a world point; y grows downwards.
    pub fn to_pixel(&self, p: Vec3) -> Vec2 {
        let local = (p.truncate() - self.origin) * self.scale;
        Vec2::new(local.x, (self.height.saturating_sub(1)) as f32 - local.y)
    }
}

/// Rasterise `mesh` into a square image.
pub fn render_heightmap(mesh: &Mesh, size: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND);
    if mesh.face_count() == 0 || size == 0 {
        return img;
    }
    let view = Viewport::fit(mesh, size);
    let bounds = mesh.bounds();
    let (z_min, z_range) = (bounds.min.z, bounds.size().z);
    let palette = HeightPalette::new();
    let light = Vec3::new(-0.5, 0.5, 1.0).normalize();

    for face in mesh.faces() {
        let world = mesh.face_positions(face);
        let normals = face.map(|i| mesh.normals.get(i as usize).copied().unwrap_or(Vec3::Z));
        let [a, b, c] = world.map(|p| view.to_pixel(p));

        let area = (b - a).perp_dot(c - a);
        if area.abs() < f32::EPSILON {
            continue;
        }
        let lo = a.min(b).min(c).max(Vec2::ZERO).floor();
        let hi = a.max(b).max(c).min(Vec2::splat((size - 1) as f32)).ceil();

        for py in lo.y as u32..=hi.y as u32 {
            for px in lo.x as u32..=hi.x as u32 {
                let p = Vec2::new(px as f32, py as f32);
                let w0 = (b - p).perp_dot(c - p) / area;
                let w1 = (c - p).perp_dot(a - p) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = world[0].z * w0 + world[1].z * w1 + world[2].z * w2;
                let n = (normals[0] * w0 + normals[1] * w1 + normals[2] * w2).normalize_or_zero();
                let rgb = palette.rgb_for_height(z, z_min, z_range);
                let shade = (AMBIENT + (1.0 - AMBIENT) * n.dot(light).abs()).clamp(0.0, 1.0);
                img.put_pixel(px, py, Rgb(rgb.map(|c| (c as f32 * shade) as u8)));
            }
        }
    }
    img
}

/// Draw a descent path over an image produced by [`render_heightmap`] for the same mesh.
pub fn draw_path(img: &mut RgbImage, mesh: &Mesh, path: &DescentPath) {
    let view = Viewport::fit(mesh, img.height());
    let (w, h) = img.dimensions();
    let mut plot = |p: Vec2| {
        if p.x >= 0.0 && p.y >= 0.0 && (p.x as u32) < w && (p.y as u32) < h {
            img.put_pixel(p.x as u32, p.y as u32, LAVA);
        }
    };

    if let [only] = path.points.as_slice() {
        plot(view.to_pixel(*only));
    }
    for pair in path.points.windows(2) {
        let (a, b) = (view.to_pixel(pair[0]), view.to_pixel(pair[1]));
        let steps = a.distance(b).ceil().max(1.0) as u32;
        for s in 0..=steps {
            plot(a.lerp(b, s as f32 / steps as f32).round());
        }
    }
}
