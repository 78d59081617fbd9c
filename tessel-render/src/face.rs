//! Sized, styled font instances with their glyph caches.

use std::collections::HashMap;

use crate::error::{RenderError, Result};
use crate::font::{FaceDesc, FaceStyle, Font};
use crate::glyph::{Glyph, GlyphFormat};
use crate::shaper::{AlphaMask, CosmicShaper, Shaper};

/// Text measured to derive the cell size.
///
/// There is no reliable "monospace extents" field in fonts, so a line of
/// ASCII and Latin-1 punctuation is laid out and the cell width is taken as
/// its average advance, rounding up.
pub const METRIC_SAMPLE: &str = "abcdefghijklmnopqrstuvwxyz\
                         ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                         @!\"$%&/()=?\\}][{°^~+*#'<>|-_.:,;";

/// A measured face plus its glyph cache.
///
/// The cache is unbounded and only released when the face drops. Terminal
/// output is dominated by a small working set, so eviction would only cost
/// re-rasterization in the common case.
pub struct Face<S: Shaper = CosmicShaper> {
    font: Font<S>,
    style: FaceStyle,
    width: u32,
    height: u32,
    baseline: u32,
    glyphs: HashMap<u64, Glyph>,
    rasterized: u64,
}

impl<S: Shaper> Face<S> {
    /// Resolve `desc` against `font` and measure the resulting face.
    pub fn new(font: &Font<S>, desc: &FaceDesc) -> Result<Self> {
        let style = desc.resolve();
        let (width, height, baseline) = measure(&mut *font.shaper(), &style)?;

        if width == 0 || height == 0 {
            return Err(RenderError::InvalidFont { width, height });
        }

        tracing::debug!(
            family = %style.family,
            size_px = style.size_px,
            bold = style.bold,
            italic = style.italic,
            width,
            height,
            baseline,
            "face measured"
        );

        Ok(Self {
            font: font.clone(),
            style,
            width,
            height,
            baseline,
            glyphs: HashMap::new(),
            rasterized: 0,
        })
    }

    /// Cell width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Cell height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance from the top of a cell to the baseline.
    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    pub fn style(&self) -> &FaceStyle {
        &self.style
    }

    pub fn font(&self) -> &Font<S> {
        &self.font
    }

    /// Number of glyphs in the cache.
    pub fn cached_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// Number of glyphs ever rasterized by this face.
    pub fn rasterized_count(&self) -> u64 {
        self.rasterized
    }

    /// Look up a cached glyph without rendering.
    pub fn cached(&self, id: u64) -> Option<&Glyph> {
        self.glyphs.get(&id)
    }

    /// Get the glyph for cluster `id`, rasterizing `codepoints` on a miss.
    ///
    /// On a hit `codepoints` and `cell_width` are not looked at.
    pub fn render(&mut self, id: u64, codepoints: &[u32], cell_width: u32) -> Result<&Glyph> {
        if self.glyphs.contains_key(&id) {
            return Ok(&self.glyphs[&id]);
        }

        if codepoints.is_empty() {
            return Err(RenderError::InvalidArgument("empty cluster"));
        }
        if cell_width == 0 {
            return Err(RenderError::InvalidArgument("zero cell width"));
        }

        let glyph = self.rasterize(id, codepoints, cell_width)?;
        self.glyphs.try_reserve(1)?;
        self.rasterized += 1;

        tracing::trace!(id, cell_width, cached = self.glyphs.len() + 1, "glyph rasterized");

        Ok(self.glyphs.entry(id).or_insert(glyph))
    }

    fn rasterize(&self, id: u64, codepoints: &[u32], cell_width: u32) -> Result<Glyph> {
        let text = codepoints
            .iter()
            .map(|&cp| {
                char::from_u32(cp)
                    .ok_or_else(|| RenderError::Shaping(format!("invalid code point {cp:#x}")))
            })
            .collect::<Result<String>>()?;

        let width = self
            .width
            .checked_mul(cell_width)
            .ok_or(RenderError::InvalidArgument("cell width too large"))?;

        let mut shaper = self.font.shaper();
        let layout = shaper.layout(&self.style, &text)?;
        let line = layout
            .lines
            .first()
            .ok_or_else(|| RenderError::Shaping("layout produced no lines".into()))?;

        let mut glyph = Glyph::blank(id, cell_width, GlyphFormat::A8, width, self.height)?;
        let (height, stride) = (glyph.height(), glyph.stride());
        let mut mask = AlphaMask::new(glyph.buffer_mut(), width, height, stride);

        // Flush the left side bearing against the cell edge.
        shaper.draw_line(line, &mut mask, -line.extents.x, self.baseline as i32)?;

        Ok(glyph)
    }
}

impl<S: Shaper> std::fmt::Debug for Face<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Face")
            .field("style", &self.style)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("baseline", &self.baseline)
            .field("cached", &self.glyphs.len())
            .finish_non_exhaustive()
    }
}

/// Returns `(width, height, baseline)` of a cell.
fn measure<S: Shaper>(shaper: &mut S, style: &FaceStyle) -> Result<(u32, u32, u32)> {
    let layout = shaper.layout(style, METRIC_SAMPLE)?;
    let sample_len = METRIC_SAMPLE.chars().count() as u32;

    let height = layout.extents.height;
    let width = layout.extents.width.div_ceil(sample_len);
    let baseline = (layout.baseline.ceil().max(0.0) as u32).min(height);

    Ok((width, height, baseline))
}
