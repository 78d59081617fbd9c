//! Tessel Render - glyph-caching CPU rasterizer for terminal grids.
//!
//! A [`Face`] turns clusters into cached 8-bit coverage masks sized to whole
//! cells. A [`Renderer`] owns a BGRA framebuffer and composites those masks
//! over cell backgrounds. [`draw`] walks a [`Screen`] once per frame and
//! skips cells whose age says they are already on screen.

mod draw;
mod error;
mod face;
mod font;
mod glyph;
mod renderer;
mod shaper;
mod surface;

pub use draw::{
    Age, CellAttr, CellVisit, DamageRect, DrawContext, FrameStats, HostSurface, Screen, Vte, draw,
};
pub use error::{RenderError, Result};
pub use face::{Face, METRIC_SAMPLE};
pub use font::{DEFAULT_FAMILY, DEFAULT_SIZE_PT, FaceDesc, FaceStyle, Font, points_to_pixels};
pub use glyph::{Glyph, GlyphFormat, cluster_id};
pub use renderer::{HIGHLIGHT, Renderer, div255, pack, stride_for_width};
pub use shaper::{AlphaMask, CosmicShaper, Layout, PixelRect, ShapedLine, Shaper};
pub use surface::PixmapSurface;
