//! In-memory host surface.
//!
//! Stands in for a toolkit surface when rendering headless: the framebuffer
//! is blitted into it and the margin path is filled on it, exactly as a
//! windowed host would do. Pixels use the same `0xAARRGGBB` words as the
//! renderer.

use image::{Rgba, RgbaImage};

use crate::draw::HostSurface;
use crate::renderer::{Renderer, pack};

pub struct PixmapSurface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    flushes: u64,
    damage_marks: u64,
}

impl PixmapSurface {
    /// A transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            flushes: 0,
            damage_marks: 0,
        }
    }

    /// Resize, discarding the content.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self {
            flushes: self.flushes,
            damage_marks: self.damage_marks,
            ..Self::new(width, height)
        };
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)` as `0xAARRGGBB`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Number of `flush` calls so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Number of `mark_dirty` calls so far.
    pub fn dirty_count(&self) -> u64 {
        self.damage_marks
    }

    /// Convert to a straight-alpha RGBA image.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixels[(y * self.width + x) as usize];
            let [b, g, r, a] = p.to_le_bytes();
            Rgba(unpremultiply([r, g, b], a))
        })
    }
}

fn unpremultiply([r, g, b]: [u8; 3], a: u8) -> [u8; 4] {
    match a {
        0 => [0, 0, 0, 0],
        255 => [r, g, b, 255],
        a => {
            let un = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
            [un(r), un(g), un(b), a]
        }
    }
}

impl HostSurface for PixmapSurface {
    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn mark_dirty(&mut self) {
        self.damage_marks += 1;
    }

    fn blit(&mut self, renderer: &Renderer, x: i32, y: i32) {
        let src_w = renderer.width() as i64;
        let src_h = renderer.height() as i64;
        let x0 = (x as i64).max(0);
        let y0 = (y as i64).max(0);
        let x1 = (x as i64 + src_w).min(self.width as i64);
        let y1 = (y as i64 + src_h).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for dy in y0..y1 {
            let Some(src) = renderer.row((dy - y as i64) as u32) else {
                break;
            };
            let src = &src[(x0 - x as i64) as usize..(x1 - x as i64) as usize];
            let start = (dy as u32 * self.width) as usize + x0 as usize;
            for (dst, &word) in self.pixels[start..start + src.len()].iter_mut().zip(src) {
                *dst = u32::from_le(word);
            }
        }
    }

    fn fill_path(&mut self, points: &[(f64, f64)], r: u8, g: u8, b: u8) {
        if points.len() < 3 {
            return;
        }
        let color = pack(r, g, b);
        let mut crossings = Vec::new();

        // Even-odd rule, sampled at pixel centers.
        for py in 0..self.height {
            let sy = py as f64 + 0.5;
            crossings.clear();

            for (i, &(ax, ay)) in points.iter().enumerate() {
                let (bx, by) = points[(i + 1) % points.len()];
                if (ay <= sy) == (by <= sy) {
                    continue;
                }
                crossings.push(ax + (sy - ay) * (bx - ax) / (by - ay));
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            let row = (py * self.width) as usize;
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as u32;
                let end = ((span[1] - 0.5).ceil().max(0.0) as u32).min(self.width);
                if start < end {
                    self.pixels[row + start as usize..row + end as usize].fill(color);
                }
            }
        }
    }
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
