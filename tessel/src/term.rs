//! A headless terminal window: VT screen, face, framebuffer and surface.

use std::path::Path;

use anyhow::Context;
use tessel_render::{
    CosmicShaper, DamageRect, DrawContext, Face, Font, FrameStats, PixmapSurface, Renderer,
    Shaper, draw,
};
use tessel_term::TerminalScreen;

use crate::config::Config;
use crate::pty::{PtyEvent, PtySession};

/// Columns and rows that fit in `width` x `height` pixels, each at least 1.
pub fn grid_size(width: u32, height: u32, cell_width: u32, cell_height: u32) -> (u32, u32) {
    (
        (width / cell_width.max(1)).max(1),
        (height / cell_height.max(1)).max(1),
    )
}

/// Round a window size down to a whole number of cells, keeping at least one.
pub fn snap_size(width: u32, height: u32, cell_width: u32, cell_height: u32) -> (u32, u32) {
    let (cols, rows) = grid_size(width, height, cell_width, cell_height);
    (cols * cell_width, rows * cell_height)
}

pub struct Terminal<S: Shaper = CosmicShaper> {
    face: Face<S>,
    screen: TerminalScreen,
    renderer: Renderer,
    surface: PixmapSurface,
    /// Child process whose output feeds the screen, if any.
    pty: Option<PtySession>,
    show_dirty: bool,
    snap: bool,
}

impl Terminal {
    /// Open a terminal using the system fonts.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_font(&Font::new(), config)
    }
}

impl<S: Shaper> Terminal<S> {
    pub fn with_font(font: &Font<S>, config: &Config) -> anyhow::Result<Self> {
        let face = Face::new(font, &config.face).context("failed to load font")?;

        let (mut width, mut height) = (config.width, config.height);
        if config.snap_size {
            (width, height) = snap_size(width, height, face.width(), face.height());
        }
        let (cols, rows) = grid_size(width, height, face.width(), face.height());

        let screen = TerminalScreen::new(cols, rows, config.scrollback)?;
        let renderer = Renderer::new(width, height).context("failed to allocate framebuffer")?;

        tracing::info!(
            width,
            height,
            cols,
            rows,
            cell_width = face.width(),
            cell_height = face.height(),
            "terminal opened"
        );

        Ok(Self {
            face,
            screen,
            renderer,
            surface: PixmapSurface::new(width, height),
            pty: None,
            show_dirty: config.show_dirty,
            snap: config.snap_size,
        })
    }

    pub fn face(&self) -> &Face<S> {
        &self.face
    }

    pub fn screen(&self) -> &TerminalScreen {
        &self.screen
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn surface(&self) -> &PixmapSurface {
        &self.surface
    }

    /// `(columns, rows)` of the screen.
    pub fn grid(&self) -> (u32, u32) {
        self.screen.size()
    }

    /// Feed output into the VT and answer any queries it contained.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.screen.feed(bytes);

        let replies = self.screen.take_replies();
        if replies.is_empty() {
            return;
        }
        match &mut self.pty {
            Some(pty) => {
                if let Err(err) = pty.write(&replies) {
                    tracing::warn!(%err, "dropping VT reply");
                }
            }
            None => tracing::trace!(bytes = replies.len(), "no pty for VT reply"),
        }
    }

    /// Start `command` on a PTY sized to the grid. Its output is consumed by
    /// [`Terminal::pump`].
    pub fn spawn(&mut self, command: &str) -> anyhow::Result<()> {
        let (cols, rows) = self.grid();
        self.pty = Some(PtySession::spawn(command, cols, rows)?);
        Ok(())
    }

    /// Feed child output and draw a frame per chunk until the child exits.
    /// Returns its exit code, or `None` if there is no child or the output
    /// ended without one.
    pub fn pump(&mut self) -> Option<i32> {
        loop {
            let event = self.pty.as_ref()?.next_event()?;
            match event {
                PtyEvent::Output(bytes) => {
                    self.feed(&bytes);
                    let stats = self.redraw();
                    tracing::debug!(bytes = bytes.len(), drawn = stats.drawn, "pty output");
                }
                PtyEvent::Exited(code) => return Some(code),
            }
        }
    }

    /// Apply a new window size. Returns the grid size now in effect.
    ///
    /// If the framebuffer cannot be reallocated the previous one is kept
    /// and the window keeps its old size.
    pub fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<(u32, u32)> {
        let (cw, ch) = (self.face.width(), self.face.height());
        let (width, height) = if self.snap {
            snap_size(width, height, cw, ch)
        } else {
            (width.max(1), height.max(1))
        };
        let (cols, rows) = grid_size(width, height, cw, ch);

        if (width, height) == (self.renderer.width(), self.renderer.height()) {
            return Ok(self.grid());
        }

        if let Err(err) = self.renderer.resize(width, height) {
            tracing::error!(width, height, %err, "framebuffer resize failed");
            return Ok(self.grid());
        }
        self.surface.resize(width, height);
        self.screen.resize(cols, rows)?;
        if let Some(pty) = &self.pty {
            if let Err(err) = pty.resize(cols, rows) {
                tracing::warn!(cols, rows, %err, "pty resize failed");
            }
        }

        tracing::debug!(width, height, cols, rows, "window resized");
        Ok((cols, rows))
    }

    /// Compose one frame over the whole window.
    pub fn redraw(&mut self) -> FrameStats {
        let palette = self.screen.palette();
        let (cell_width, cell_height) = (self.face.width(), self.face.height());
        let mut ctx = DrawContext {
            damage: DamageRect::full(self.renderer.width(), self.renderer.height()),
            renderer: &mut self.renderer,
            surface: &mut self.surface,
            face: &mut self.face,
            cell_width,
            cell_height,
            screen: &mut self.screen,
            vte: &palette,
            debug: self.show_dirty,
        };
        draw(&mut ctx)
    }

    /// Write the surface as a PNG.
    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        self.surface
            .to_image()
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
