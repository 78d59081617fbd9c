//! Text shaping backends.
//!
//! The face only needs three things from a shaper: lay out a string as a
//! single left-to-right line, report its pixel extents and baseline, and
//! draw that line as coverage into an 8-bit alpha mask. [`CosmicShaper`]
//! provides them on top of cosmic-text; tests plug in deterministic
//! shapers through the same trait.

use cosmic_text::{
    Attrs, Buffer, Family, FontSystem, LayoutGlyph, Metrics, Shaping, Style, SwashCache,
    SwashContent, Weight,
};

use crate::error::Result;
use crate::font::FaceStyle;
use crate::renderer::div255;

/// Line height relative to the font size.
const LINE_HEIGHT: f32 = 1.2;

/// An integer pixel rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One shaped line.
#[derive(Debug, Clone)]
pub struct ShapedLine<G> {
    /// Logical extents relative to the line origin. The origin sits on the
    /// baseline, so `y` is negative by the ascent.
    pub extents: PixelRect,
    pub glyphs: Vec<G>,
}

/// A shaped paragraph.
#[derive(Debug, Clone)]
pub struct Layout<G> {
    pub lines: Vec<ShapedLine<G>>,
    /// Logical extents of the whole layout, relative to its top-left corner.
    pub extents: PixelRect,
    /// Distance from the top of the layout to the first baseline.
    pub baseline: f32,
}

/// Text shaping and rasterization backend.
pub trait Shaper {
    /// Backend specific positioned glyph.
    type Glyph;

    /// Lay out `text` left-to-right with no wrapping.
    fn layout(&mut self, style: &FaceStyle, text: &str) -> Result<Layout<Self::Glyph>>;

    /// Draw `line` with its origin (baseline start) at `(x, y)` into
    /// `target`, as opaque white coverage composited OVER the mask.
    fn draw_line(
        &mut self,
        line: &ShapedLine<Self::Glyph>,
        target: &mut AlphaMask<'_>,
        x: i32,
        y: i32,
    ) -> Result<()>;
}

/// Borrowed 8-bit alpha surface a shaper draws into.
pub struct AlphaMask<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'a> AlphaMask<'a> {
    /// `data` must hold at least `stride * height` bytes.
    pub fn new(data: &'a mut [u8], width: u32, height: u32, stride: u32) -> Self {
        debug_assert!(stride >= width);
        debug_assert!(data.len() >= stride as usize * height as usize);
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Composite `coverage` at `(x, y)`. Out of bounds writes are dropped.
    #[inline]
    pub fn cover(&mut self, x: i32, y: i32, coverage: u8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = y as usize * self.stride as usize + x as usize;
        let dst = self.data[idx] as u32;
        let a = coverage as u32;
        self.data[idx] = (a + div255(dst * (255 - a))) as u8;
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.data[y as usize * self.stride as usize + x as usize]
    }
}

/// Shaper backed by cosmic-text's font system and swash rasterizer.
pub struct CosmicShaper {
    fonts: FontSystem,
    swash: SwashCache,
}

impl CosmicShaper {
    /// Load the system font database.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(fonts: FontSystem) -> Self {
        Self {
            fonts,
            swash: SwashCache::new(),
        }
    }

    /// Whether any font faces were found.
    pub fn has_fonts(&self) -> bool {
        self.fonts.db().faces().next().is_some()
    }
}

impl Default for CosmicShaper {
    fn default() -> Self {
        Self::new()
    }
}

fn attrs_for(style: &FaceStyle) -> Attrs<'_> {
    let family = match style.family.to_ascii_lowercase().as_str() {
        "monospace" | "mono" => Family::Monospace,
        "sans" | "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        _ => Family::Name(&style.family),
    };

    Attrs::new()
        .family(family)
        .weight(if style.bold { Weight::BOLD } else { Weight::NORMAL })
        .style(if style.italic { Style::Italic } else { Style::Normal })
}

impl Shaper for CosmicShaper {
    type Glyph = LayoutGlyph;

    fn layout(&mut self, style: &FaceStyle, text: &str) -> Result<Layout<LayoutGlyph>> {
        let metrics = Metrics::new(style.size_px, (style.size_px * LINE_HEIGHT).ceil());
        let mut buffer = Buffer::new(&mut self.fonts, metrics);
        buffer.set_size(&mut self.fonts, Some(f32::MAX), Some(f32::MAX));
        buffer.set_text(&mut self.fonts, text, attrs_for(style), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.fonts, false);

        let mut lines = Vec::new();
        let mut extents = PixelRect::default();
        let mut baseline = None;

        for run in buffer.layout_runs() {
            let ascent = (run.line_y - run.line_top).ceil() as i32;
            let line_extents = PixelRect {
                x: run
                    .glyphs
                    .iter()
                    .map(|g| g.x.floor() as i32)
                    .min()
                    .unwrap_or(0)
                    .min(0),
                y: -ascent,
                width: run.line_w.ceil() as u32,
                height: run.line_height.ceil() as u32,
            };

            baseline.get_or_insert(run.line_y);
            extents.width = extents.width.max(line_extents.width);
            extents.height += line_extents.height;

            lines.push(ShapedLine {
                extents: line_extents,
                glyphs: run.glyphs.to_vec(),
            });
        }

        Ok(Layout {
            lines,
            extents,
            baseline: baseline.unwrap_or(0.0),
        })
    }

    fn draw_line(
        &mut self,
        line: &ShapedLine<LayoutGlyph>,
        target: &mut AlphaMask<'_>,
        x: i32,
        y: i32,
    ) -> Result<()> {
        for glyph in &line.glyphs {
            let physical = glyph.physical((x as f32, y as f32), 1.0);
            let Some(image) = self
                .swash
                .get_image(&mut self.fonts, physical.cache_key)
                .as_ref()
            else {
                continue;
            };

            let width = image.placement.width as usize;
            let height = image.placement.height as usize;
            if width == 0 || height == 0 {
                continue;
            }
            let bytes_per_pixel = (image.data.len() / (width * height)).max(1);
            let left = physical.x + image.placement.left;
            let top = physical.y - image.placement.top;

            for row in 0..height {
                for col in 0..width {
                    let idx = (row * width + col) * bytes_per_pixel;
                    let coverage = match image.content {
                        SwashContent::Mask => image.data.get(idx).copied().unwrap_or(0),
                        SwashContent::Color => image.data.get(idx + 3).copied().unwrap_or(0),
                        SwashContent::SubpixelMask => {
                            let sum: u32 = (0..3)
                                .map(|c| image.data.get(idx + c).copied().unwrap_or(0) as u32)
                                .sum();
                            (sum / 3) as u8
                        }
                    };
                    if coverage != 0 {
                        target.cover(left + col as i32, top + row as i32, coverage);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::RenderError;

    /// Shaper that never produces a line.
    pub(crate) struct NullShaper;

    impl Shaper for NullShaper {
        type Glyph = ();

        fn layout(&mut self, _style: &FaceStyle, _text: &str) -> Result<Layout<()>> {
            Ok(Layout {
                lines: Vec::new(),
                extents: PixelRect::default(),
                baseline: 0.0,
            })
        }

        fn draw_line(
            &mut self,
            _line: &ShapedLine<()>,
            _target: &mut AlphaMask<'_>,
            _x: i32,
            _y: i32,
        ) -> Result<()> {
            Err(RenderError::Shaping("nothing to draw".into()))
        }
    }

    #[test]
    fn test_cover_composites_over() {
        let mut data = vec![0u8; 8];
        let mut mask = AlphaMask::new(&mut data, 2, 2, 4);
        mask.cover(0, 0, 255);
        mask.cover(1, 1, 128);
        mask.cover(1, 1, 128);
        // 128 + 128 * 127 / 255
        assert_eq!(mask.get(0, 0), 255);
        assert_eq!(mask.get(1, 1), 192);
        assert_eq!(mask.get(1, 0), 0);
    }

    #[test]
    fn test_cover_drops_out_of_bounds() {
        let mut data = vec![0u8; 8];
        let mut mask = AlphaMask::new(&mut data, 2, 2, 4);
        mask.cover(-1, 0, 255);
        mask.cover(2, 0, 255);
        mask.cover(0, 2, 255);
        assert!(data.iter().all(|&a| a == 0));
    }

    #[test]
    fn test_cosmic_layout_single_line() {
        let mut shaper = CosmicShaper::new();
        if !shaper.has_fonts() {
            return;
        }
        let style = crate::FaceDesc::default().resolve();
        let layout = shaper.layout(&style, "abc").unwrap();
        assert_eq!(layout.lines.len(), 1);
        assert!(layout.extents.width > 0);
        assert!(layout.extents.height > 0);
        assert!(layout.baseline > 0.0);
    }
}
