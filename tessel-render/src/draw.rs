//! Per-frame composition of the terminal surface.
//!
//! The screen pushes every visible cell through a visitor; each visit turns
//! into one fill or one glyph blend on the renderer. Cells the screen reports
//! as older than the renderer's watermark are already on screen and are
//! skipped. Finally the framebuffer is blitted to the host surface and the
//! area outside the cell grid is painted with the default background.

use crate::face::Face;
use crate::renderer::Renderer;
use crate::shaper::{CosmicShaper, Shaper};

/// Screen generation counter. 0 means "unknown, always redraw".
pub type Age = u32;

/// Colors of a cell as resolved by the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellAttr {
    pub fr: u8,
    pub fg: u8,
    pub fb: u8,
    pub br: u8,
    pub bg: u8,
    pub bb: u8,
    /// Swap foreground and background when drawing.
    pub inverse: bool,
}

impl CellAttr {
    pub const fn new(fg: (u8, u8, u8), bg: (u8, u8, u8)) -> Self {
        Self {
            fr: fg.0,
            fg: fg.1,
            fb: fg.2,
            br: bg.0,
            bg: bg.1,
            bb: bg.2,
            inverse: false,
        }
    }

    /// `(foreground, background)` after applying `inverse`.
    pub fn colors(&self) -> ((u8, u8, u8), (u8, u8, u8)) {
        let fore = (self.fr, self.fg, self.fb);
        let back = (self.br, self.bg, self.bb);
        if self.inverse { (back, fore) } else { (fore, back) }
    }
}

/// One visible cell, as pushed by [`Screen::draw`].
#[derive(Debug, Clone, Copy)]
pub struct CellVisit<'a> {
    /// Cache id of the cluster.
    pub id: u64,
    /// The cluster; empty for background-only cells.
    pub codepoints: &'a [u32],
    /// Cells covered, 2 for wide characters.
    pub cell_width: u32,
    pub col: u32,
    pub row: u32,
    pub attr: CellAttr,
    pub age: Age,
}

/// Upstream screen model.
pub trait Screen {
    /// Visit every visible cell and return the age of this enumeration.
    fn draw(&mut self, visit: &mut dyn FnMut(&CellVisit<'_>)) -> Age;

    /// Grid width in cells.
    fn columns(&self) -> u32;

    /// Grid height in cells.
    fn rows(&self) -> u32;
}

/// Source of the default attribute, used for margin padding.
pub trait Vte {
    fn default_attr(&self) -> CellAttr;
}

/// Surface the host toolkit displays.
pub trait HostSurface {
    /// Make pending host-side drawing visible before CPU writes.
    fn flush(&mut self);

    /// Tell the host CPU writes happened.
    fn mark_dirty(&mut self);

    /// Copy the framebuffer onto the surface with its origin at `(x, y)`.
    fn blit(&mut self, renderer: &Renderer, x: i32, y: i32);

    /// Fill the closed polygon through `points` with an opaque color.
    fn fill_path(&mut self, points: &[(f64, f64)], r: u8, g: u8, b: u8);
}

/// Region the host asked to repaint, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl DamageRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Damage covering a whole `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// Strict overlap; touching edges and empty damage never overlap.
    pub fn overlaps(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
        self.x1 < x2 && self.x2 > x1 && self.y1 < y2 && self.y2 > y1
    }
}

/// Everything one frame borrows.
pub struct DrawContext<'a, S: Shaper = CosmicShaper> {
    pub damage: DamageRect,
    pub renderer: &'a mut Renderer,
    pub surface: &'a mut dyn HostSurface,
    pub face: &'a mut Face<S>,
    pub cell_width: u32,
    pub cell_height: u32,
    pub screen: &'a mut dyn Screen,
    pub vte: &'a dyn Vte,
    /// Outline redrawn cells and draw skipped ones anyway.
    pub debug: bool,
}

/// What a frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cells painted.
    pub drawn: u32,
    /// Cells left untouched because they were already on screen.
    pub skipped: u32,
    /// Glyph cells that fell back to a background fill.
    pub fallbacks: u32,
    /// Age stored into the renderer.
    pub age: Age,
}

/// Compose one frame. Never fails: a glyph that cannot be rendered turns
/// into a background fill.
pub fn draw<S: Shaper>(ctx: &mut DrawContext<'_, S>) -> FrameStats {
    let DrawContext {
        damage,
        renderer,
        surface,
        face,
        cell_width,
        cell_height,
        screen,
        vte,
        debug,
    } = ctx;
    let (damage, cw, ch, debug) = (*damage, *cell_width, *cell_height, *debug);
    let mut stats = FrameStats::default();

    surface.flush();

    let watermark = renderer.age();
    let age = screen.draw(&mut |cell| {
        let x = cell.col.saturating_mul(cw);
        let y = cell.row.saturating_mul(ch);
        let width = cw.saturating_mul(cell.cell_width);

        let skip = damage.overlaps(x as f64, y as f64, x as f64 + cw as f64, y as f64 + ch as f64)
            && cell.age != 0
            && watermark != 0
            && cell.age <= watermark;

        if skip {
            stats.skipped += 1;
            if !debug {
                return;
            }
        } else {
            stats.drawn += 1;
        }

        let ((fr, fg, fb), (br, bg, bb)) = cell.attr.colors();

        if cell.codepoints.is_empty() {
            renderer.fill(x, y, width, ch, br, bg, bb);
        } else {
            let blended = face
                .render(cell.id, cell.codepoints, cell.cell_width)
                .and_then(|glyph| renderer.blend(glyph, x, y, fr, fg, fb, br, bg, bb));
            if let Err(err) = blended {
                tracing::trace!(col = cell.col, row = cell.row, %err, "glyph fallback");
                stats.fallbacks += 1;
                renderer.fill(x, y, width, ch, br, bg, bb);
            }
        }

        if debug && !skip {
            renderer.highlight(x, y, width, ch);
        }
    });

    renderer.set_age(age);
    stats.age = age;

    surface.mark_dirty();
    surface.blit(renderer, 0, 0);

    // Pad the area right of and below the grid. This is an L-shaped path
    // around the grid's bottom-right corner.
    let grid_w = screen.columns() as f64 * cw as f64;
    let grid_h = screen.rows() as f64 * ch as f64;
    let (fb_w, fb_h) = (renderer.width() as f64, renderer.height() as f64);
    let pad = vte.default_attr();
    surface.fill_path(
        &[
            (grid_w, 0.0),
            (grid_w, grid_h),
            (0.0, grid_h),
            (0.0, fb_h),
            (fb_w, fb_h),
            (fb_w, 0.0),
        ],
        pad.br,
        pad.bg,
        pad.bb,
    );

    tracing::debug!(
        drawn = stats.drawn,
        skipped = stats.skipped,
        fallbacks = stats.fallbacks,
        age,
        "frame composed"
    );

    stats
}
