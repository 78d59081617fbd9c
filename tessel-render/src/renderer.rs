//! CPU framebuffer and its drawing primitives.
//!
//! Pixels are 32-bit words `0xAARRGGBB` stored little-endian, i.e. B, G, R,
//! A in memory, which is the premultiplied ARGB-32 layout hosts blit from.
//! Alpha is always opaque.

use crate::error::{RenderError, Result, try_alloc};
use crate::glyph::{Glyph, GlyphFormat};

/// Scanline alignment of the framebuffer, in bytes.
pub const STRIDE_ALIGN: u32 = 16;

/// Color of the debug outline drawn by [`Renderer::highlight`].
pub const HIGHLIGHT: (u8, u8, u8) = (0xd0, 0x10, 0x10);

/// Divide `t` by 255, rounding to nearest.
///
/// Exact for every `t` in `0..=255 * 255`, which covers any product of two
/// channels. Replaces the division on the blend path.
#[inline(always)]
pub fn div255(t: u32) -> u32 {
    let t = t + 0x80;
    (t + (t >> 8)) >> 8
}

/// Pack an opaque pixel.
#[inline(always)]
pub fn pack(r: u8, g: u8, b: u8) -> u32 {
    (0xff << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Natural byte stride for an ARGB-32 scanline of `width` pixels.
pub fn stride_for_width(width: u32) -> Option<u32> {
    let bytes = width.checked_mul(4)?;
    Some(bytes.checked_add(STRIDE_ALIGN - 1)? & !(STRIDE_ALIGN - 1))
}

/// Owns the framebuffer the terminal is composited into.
pub struct Renderer {
    width: u32,
    height: u32,
    /// Bytes per scanline.
    stride: u32,
    data: Vec<u32>,
    age: u32,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut renderer = Self {
            width: 0,
            height: 0,
            stride: 0,
            data: Vec::new(),
            age: 0,
        };
        renderer.resize(width, height)?;
        Ok(renderer)
    }

    /// Reallocate for a new size. The age is reset so the next frame
    /// repaints everything. On failure the previous buffer is kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let stride = stride_for_width(width).ok_or(RenderError::OutOfMemory)?;
        let words = (stride as usize / 4)
            .checked_mul(height as usize)
            .ok_or(RenderError::OutOfMemory)?;
        let data = try_alloc(words)?;

        self.width = width;
        self.height = height;
        self.stride = stride;
        self.data = data;
        self.age = 0;

        tracing::debug!(width, height, stride, "framebuffer allocated");
        Ok(())
    }

    /// Drop the age watermark so the next frame repaints every cell.
    pub fn dirty(&mut self) {
        self.age = 0;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per scanline.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Watermark of the last frame drawn; 0 means nothing can be skipped.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub(crate) fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    /// Framebuffer as bytes, `stride * height` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// One scanline, `width` pixels long, or `None` past the bottom edge.
    pub fn row(&self, y: u32) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.words_per_row();
        self.data.get(start..start + self.width as usize)
    }

    /// Pixel value at `(x, y)` as `0xAARRGGBB`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(u32::from_le(self.data[y as usize * self.words_per_row() + x as usize]))
    }

    #[inline]
    fn words_per_row(&self) -> usize {
        self.stride as usize / 4
    }

    /// Clip a rectangle to the framebuffer. `None` when nothing is left.
    fn clip(&self, x: u32, y: u32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let right = x.checked_add(width)?;
        if right <= x || x >= self.width {
            return None;
        }
        let bottom = y.checked_add(height)?;
        if bottom <= y || y >= self.height {
            return None;
        }
        Some((
            x,
            y,
            right.min(self.width) - x,
            bottom.min(self.height) - y,
        ))
    }

    /// Fill a rectangle with a solid color.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(&mut self, x: u32, y: u32, width: u32, height: u32, r: u8, g: u8, b: u8) {
        let Some((x, y, width, height)) = self.clip(x, y, width, height) else {
            return;
        };
        let out = pack(r, g, b).to_le();
        let words = self.words_per_row();

        for row in self.data[y as usize * words..]
            .chunks_mut(words)
            .take(height as usize)
        {
            row[x as usize..(x + width) as usize].fill(out);
        }
    }

    /// Draw a 1-pixel debug outline just inside a rectangle.
    pub fn highlight(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let Some((x, y, width, height)) = self.clip(x, y, width, height) else {
            return;
        };
        let (r, g, b) = HIGHLIGHT;
        let out = pack(r, g, b).to_le();
        let words = self.words_per_row();

        for (i, row) in self.data[y as usize * words..]
            .chunks_mut(words)
            .take(height as usize)
            .enumerate()
        {
            let span = &mut row[x as usize..(x + width) as usize];
            if i == 0 || i + 1 == height as usize {
                span.fill(out);
            } else {
                span[0] = out;
                span[width as usize - 1] = out;
            }
        }
    }

    /// Composite an A8 glyph at `(x, y)`, mixing the foreground into the
    /// background by the mask's coverage.
    #[allow(clippy::too_many_arguments)]
    pub fn blend(
        &mut self,
        glyph: &Glyph,
        x: u32,
        y: u32,
        fr: u8,
        fg: u8,
        fb: u8,
        br: u8,
        bg: u8,
        bb: u8,
    ) -> Result<()> {
        if glyph.format() != GlyphFormat::A8 {
            return Err(RenderError::UnsupportedFormat(glyph.format()));
        }
        let Some((x, y, width, height)) = self.clip(x, y, glyph.width(), glyph.height()) else {
            return Ok(());
        };

        let fore = pack(fr, fg, fb).to_le();
        let back = pack(br, bg, bb).to_le();
        let (fr, fg, fb) = (fr as u32, fg as u32, fb as u32);
        let (br, bg, bb) = (br as u32, bg as u32, bb as u32);
        let words = self.words_per_row();
        let src_stride = glyph.stride() as usize;
        let src = glyph.buffer();

        for (i, row) in self.data[y as usize * words..]
            .chunks_mut(words)
            .take(height as usize)
            .enumerate()
        {
            let mask = &src[i * src_stride..i * src_stride + width as usize];
            let dst = &mut row[x as usize..(x + width) as usize];

            for (out, &a) in dst.iter_mut().zip(mask) {
                *out = match a {
                    0 => back,
                    255 => fore,
                    a => {
                        let a = a as u32;
                        let na = 255 - a;
                        let r = div255(fr * a + br * na);
                        let g = div255(fg * a + bg * na);
                        let b = div255(fb * a + bb * na);
                        pack(r as u8, g as u8, b as u8).to_le()
                    }
                };
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_with(width: u32, height: u32, coverage: u8) -> Glyph {
        let mut glyph = Glyph::blank(1, 1, GlyphFormat::A8, width, height).unwrap();
        glyph.buffer_mut().fill(coverage);
        glyph
    }

    fn checksum(renderer: &Renderer) -> Vec<u32> {
        (0..renderer.height())
            .flat_map(|y| renderer.row(y).unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_div255_matches_exact_division() {
        let channels = [0u32, 1, 10, 20, 30, 64, 127, 128, 200, 254, 255];
        for a in 0..=255u32 {
            for &f in &channels {
                for &b in &channels {
                    let t = f * a + b * (255 - a);
                    let exact = (t + 127) / 255;
                    let fast = div255(t);
                    assert!(
                        fast.abs_diff(exact) <= 1,
                        "a={a} f={f} b={b}: {fast} vs {exact}"
                    );
                    assert_eq!(fast, (t as f64 / 255.0).round() as u32);
                }
            }
        }
    }

    #[test]
    fn test_div255_full_range() {
        for t in 0..=255 * 255u32 {
            assert_eq!(div255(t), (t as f64 / 255.0).round() as u32, "t={t}");
        }
    }

    #[test]
    fn test_stride_is_aligned() {
        let r = Renderer::new(103, 57).unwrap();
        assert_eq!(r.stride(), 416);
        assert!(r.stride() >= 4 * r.width());
        assert_eq!(r.as_bytes().len(), (r.stride() * r.height()) as usize);
    }

    #[test]
    fn test_resize_resets_age() {
        let mut r = Renderer::new(20, 20).unwrap();
        r.set_age(7);
        r.resize(20, 20).unwrap();
        assert_eq!(r.age(), 0);
        assert_eq!(r.as_bytes().len(), (r.stride() * 20) as usize);

        r.set_age(3);
        r.dirty();
        assert_eq!(r.age(), 0);
    }

    #[test]
    fn test_resize_overflow_keeps_buffer() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.fill(0, 0, 10, 10, 1, 2, 3);
        r.set_age(4);
        assert!(matches!(r.resize(u32::MAX, 2), Err(RenderError::OutOfMemory)));
        assert_eq!(r.width(), 10);
        assert_eq!(r.age(), 4);
        assert_eq!(r.pixel(9, 9), Some(0xff010203));
    }

    #[test]
    fn test_fill_writes_bgra_bytes() {
        let mut r = Renderer::new(4, 4).unwrap();
        r.fill(1, 1, 2, 2, 0x11, 0x22, 0x33);
        assert_eq!(r.pixel(1, 1), Some(0xff112233));
        assert_eq!(r.pixel(0, 0), Some(0));
        assert_eq!(r.pixel(3, 2), Some(0));
        let off = (r.stride() + 4) as usize;
        assert_eq!(&r.as_bytes()[off..off + 4], &[0x33, 0x22, 0x11, 0xff]);
    }

    #[test]
    fn test_fill_clips() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.fill(8, 8, 100, 100, 255, 0, 0);
        assert_eq!(r.pixel(9, 9), Some(0xffff0000));
        assert_eq!(r.pixel(7, 9), Some(0));
    }

    #[test]
    fn test_fill_outside_is_noop() {
        let mut r = Renderer::new(10, 10).unwrap();
        let before = checksum(&r);
        r.fill(10, 0, 5, 5, 255, 255, 255);
        r.fill(0, 10, 5, 5, 255, 255, 255);
        r.fill(u32::MAX - 1, 0, 5, 5, 255, 255, 255);
        r.fill(0, 0, 0, 5, 255, 255, 255);
        r.fill(0, 0, 5, 0, 255, 255, 255);
        assert_eq!(checksum(&r), before);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.fill(2, 3, 4, 5, 9, 8, 7);
        let once = checksum(&r);
        r.fill(2, 3, 4, 5, 9, 8, 7);
        assert_eq!(checksum(&r), once);
    }

    #[test]
    fn test_highlight_outline() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.highlight(2, 2, 4, 3);
        let red = pack(0xd0, 0x10, 0x10);
        for x in 2..6 {
            assert_eq!(r.pixel(x, 2), Some(red));
            assert_eq!(r.pixel(x, 4), Some(red));
        }
        assert_eq!(r.pixel(2, 3), Some(red));
        assert_eq!(r.pixel(5, 3), Some(red));
        assert_eq!(r.pixel(3, 3), Some(0));
        assert_eq!(r.pixel(6, 3), Some(0));
    }

    #[test]
    fn test_blend_full_mask_is_foreground_fill() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.blend(&glyph_with(10, 10, 255), 0, 0, 10, 20, 30, 200, 200, 200)
            .unwrap();
        for y in 0..10 {
            assert!(r.row(y).unwrap().iter().all(|&p| u32::from_le(p) == 0xff0a141e));
        }
        assert!(r.row(10).is_none());

        let mut filled = Renderer::new(10, 10).unwrap();
        filled.fill(0, 0, 10, 10, 10, 20, 30);
        assert_eq!(checksum(&r), checksum(&filled));
    }

    #[test]
    fn test_blend_empty_mask_is_background_fill() {
        let mut r = Renderer::new(12, 12).unwrap();
        r.blend(&glyph_with(10, 10, 0), 1, 1, 10, 20, 30, 200, 100, 50)
            .unwrap();
        let mut filled = Renderer::new(12, 12).unwrap();
        filled.fill(1, 1, 10, 10, 200, 100, 50);
        assert_eq!(checksum(&r), checksum(&filled));
    }

    #[test]
    fn test_blend_half_mask() {
        let mut r = Renderer::new(10, 10).unwrap();
        r.blend(&glyph_with(10, 10, 128), 0, 0, 10, 20, 30, 200, 200, 200)
            .unwrap();
        assert_eq!(r.pixel(0, 0), Some(pack(105, 110, 115)));
        assert_eq!(r.pixel(9, 9), Some(pack(105, 110, 115)));
    }

    #[test]
    fn test_blend_respects_glyph_stride_and_clip() {
        // width 5 gives a stride of 8, so padding bytes must be skipped
        let mut glyph = Glyph::blank(1, 1, GlyphFormat::A8, 5, 2).unwrap();
        assert_eq!(glyph.stride(), 8);
        let buf = glyph.buffer_mut();
        buf[..5].fill(255);
        buf[5..8].fill(7);
        buf[8..13].fill(0);

        let mut r = Renderer::new(8, 8).unwrap();
        r.blend(&glyph, 5, 6, 255, 255, 255, 0, 0, 0).unwrap();
        assert_eq!(r.pixel(5, 6), Some(0xffffffff));
        assert_eq!(r.pixel(7, 6), Some(0xffffffff));
        assert_eq!(r.pixel(5, 7), Some(0xff000000));
        assert_eq!(r.pixel(4, 6), Some(0));
    }

    #[test]
    fn test_blend_rejects_non_a8() {
        let glyph = Glyph::blank(1, 1, GlyphFormat::Rgb24, 4, 4).unwrap();
        let mut r = Renderer::new(8, 8).unwrap();
        let before = checksum(&r);
        let err = r.blend(&glyph, 0, 0, 1, 1, 1, 2, 2, 2).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(GlyphFormat::Rgb24)));
        assert_eq!(checksum(&r), before);
    }
}
