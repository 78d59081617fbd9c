//! Rasterized glyphs and cluster identifiers.
//!
//! A glyph is the coverage mask of one cluster, sized to a whole number of
//! cells. Glyphs are owned by the cache of the face that rendered them and
//! are only ever lent out for the duration of a blend.

use crate::error::{Result, try_alloc};

/// Pixel format of a glyph mask.
///
/// Only `A8` is produced and consumed. The other variants are carried so a
/// color or bitmap backend can be added without changing the glyph layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphFormat {
    /// 1 bit of coverage per pixel.
    A1,
    /// 8 bits of coverage per pixel.
    A8,
    /// 32-bit xRGB.
    Rgb24,
}

impl GlyphFormat {
    /// Bits used by one pixel.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            GlyphFormat::A1 => 1,
            GlyphFormat::A8 => 8,
            GlyphFormat::Rgb24 => 32,
        }
    }

    /// Natural stride in bytes for a scanline of `width` pixels.
    ///
    /// Scanlines are rounded up to whole bytes, then to a multiple of 4.
    /// Returns `None` on overflow.
    pub fn stride_for_width(self, width: u32) -> Option<u32> {
        let bits = width.checked_mul(self.bits_per_pixel())?;
        let bytes = bits.checked_add(7)? / 8;
        Some(bytes.checked_add(3)? & !3)
    }
}

/// A cached rasterized cluster.
#[derive(Debug)]
pub struct Glyph {
    id: u64,
    cell_width: u32,
    format: GlyphFormat,
    width: u32,
    height: u32,
    stride: u32,
    buffer: Vec<u8>,
}

impl Glyph {
    /// Allocate a blank (fully transparent) glyph.
    pub(crate) fn blank(
        id: u64,
        cell_width: u32,
        format: GlyphFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let stride = format
            .stride_for_width(width)
            .ok_or(crate::RenderError::OutOfMemory)?;
        let len = (stride as usize)
            .checked_mul(height as usize)
            .ok_or(crate::RenderError::OutOfMemory)?;
        let buffer = try_alloc(len)?;

        Ok(Self {
            id,
            cell_width,
            format,
            width,
            height,
            stride,
            buffer,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of cells this glyph spans.
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn format(&self) -> GlyphFormat {
        self.format
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per scanline.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// The raw mask, `stride * height` bytes.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// One scanline of the mask, without stride padding. `None` below the
    /// last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        let len = match self.format {
            GlyphFormat::A8 => self.width as usize,
            _ => self.stride as usize,
        };
        self.buffer.get(start..start + len)
    }
}

const CODEPOINT_BITS: u32 = 21;
const CODEPOINT_MASK: u64 = (1 << CODEPOINT_BITS) - 1;
const HASHED_BIT: u64 = 1 << 63;

/// Build a cache id for a cluster.
///
/// A primary code point plus up to two combining marks are packed exactly,
/// so such clusters never collide. Longer clusters are hashed (FNV-1a) into
/// the upper half of the id space.
pub fn cluster_id(codepoints: &[u32]) -> u64 {
    if codepoints.len() <= 3 {
        return codepoints
            .iter()
            .enumerate()
            .fold(0u64, |id, (i, &cp)| {
                id | ((cp as u64 & CODEPOINT_MASK) << (i as u32 * CODEPOINT_BITS))
            });
    }

    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &cp in codepoints {
        for byte in cp.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash | HASHED_BIT
}
