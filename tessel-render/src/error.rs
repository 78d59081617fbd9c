//! Render error types.

use thiserror::Error;

use crate::glyph::GlyphFormat;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("out of memory")]
    OutOfMemory,

    #[error("invalid font: measured cell is {width}x{height}")]
    InvalidFont { width: u32, height: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("shaping error: {0}")]
    Shaping(String),

    #[error("unsupported glyph format: {0:?}")]
    UnsupportedFormat(GlyphFormat),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl From<std::collections::TryReserveError> for RenderError {
    fn from(_: std::collections::TryReserveError) -> Self {
        RenderError::OutOfMemory
    }
}

/// Allocate a zeroed buffer of `len` elements, reporting allocation
/// failure instead of aborting.
pub(crate) fn try_alloc<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, T::default());
    Ok(buf)
}
