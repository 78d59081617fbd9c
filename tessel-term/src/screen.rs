//! Terminal screen - feeds bytes through alacritty_terminal and enumerates
//! the visible cells for drawing.

use std::sync::{Arc, Mutex};

use alacritty_terminal::event::{Event, EventListener};
use alacritty_terminal::grid::{Dimensions, Scroll};
use alacritty_terminal::index::{Column, Line};
use alacritty_terminal::term::cell::Flags;
use alacritty_terminal::term::{Config, Term, test::TermSize};
use alacritty_terminal::vte::ansi::{CursorShape, Processor};
use tessel_render::{Age, CellAttr, CellVisit, Screen, cluster_id};

use crate::error::{Result, TermError};
use crate::palette::{Palette, dim};
use crate::shadow::ShadowGrid;

/// Default scrollback history in lines.
pub const DEFAULT_SCROLLBACK: usize = 2000;

/// A VT plus the bookkeeping needed to age its cells between frames.
pub struct TerminalScreen {
    term: Term<EventProxy>,
    processor: Processor,
    /// Bytes the VT wants sent back to the program (DSR, DA, ...).
    replies: Arc<Mutex<Vec<u8>>>,
    shadow: ShadowGrid,
    /// Age handed out by the next `draw`. Never 0.
    age: Age,
    /// Report every cell as age 0 on the next `draw`.
    reset: bool,
    scratch: Vec<u32>,
}

impl std::fmt::Debug for TerminalScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalScreen")
            .field("size", &self.size())
            .field("age", &self.age)
            .field("display_offset", &self.display_offset())
            .finish_non_exhaustive()
    }
}

/// Event listener for headless operation. Queues VT replies.
struct EventProxy {
    replies: Arc<Mutex<Vec<u8>>>,
}

impl EventListener for EventProxy {
    fn send_event(&self, event: Event) {
        match event {
            Event::PtyWrite(text) => match self.replies.lock() {
                Ok(mut replies) => replies.extend_from_slice(text.as_bytes()),
                Err(_) => tracing::warn!("reply queue poisoned, dropping VT reply"),
            },
            Event::Title(title) => tracing::trace!(%title, "terminal title"),
            _ => {}
        }
    }
}

impl TerminalScreen {
    /// Create a screen of `cols` x `rows` cells keeping `scrollback` lines
    /// of history.
    pub fn new(cols: u32, rows: u32, scrollback: usize) -> Result<Self> {
        let size = term_size(cols, rows)?;
        let config = Config {
            scrolling_history: scrollback,
            ..Config::default()
        };
        let replies = Arc::new(Mutex::new(Vec::new()));
        let proxy = EventProxy {
            replies: Arc::clone(&replies),
        };
        let term = Term::new(config, &size, proxy);

        Ok(Self {
            term,
            processor: Processor::new(),
            replies,
            shadow: ShadowGrid::new(cols as usize, rows as usize),
            age: 1,
            reset: false,
            scratch: Vec::new(),
        })
    }

    /// Feed bytes into the VT.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.processor.advance(&mut self.term, bytes);
    }

    /// Take the bytes the VT produced in answer to queries since the last
    /// call. They belong on the program's input.
    pub fn take_replies(&mut self) -> Vec<u8> {
        match self.replies.lock() {
            Ok(mut replies) => std::mem::take(&mut *replies),
            Err(_) => Vec::new(),
        }
    }

    /// Resize the VT grid. Every cell is reported as unknown on the next
    /// frame.
    pub fn resize(&mut self, cols: u32, rows: u32) -> Result<()> {
        let size = term_size(cols, rows)?;
        self.term.resize(size);
        self.shadow.resize(cols as usize, rows as usize);
        self.reset = true;
        tracing::debug!(cols, rows, "screen resized");
        Ok(())
    }

    /// `(columns, rows)`.
    pub fn size(&self) -> (u32, u32) {
        (self.term.columns() as u32, self.term.screen_lines() as u32)
    }

    /// Current colors, including OSC overrides.
    pub fn palette(&self) -> Palette {
        Palette::with_overrides(self.term.colors())
    }

    /// Age the next `draw` will return.
    pub fn age(&self) -> Age {
        self.age
    }

    /// Report every cell as unknown on the next frame.
    pub fn invalidate(&mut self) {
        self.reset = true;
    }

    /// Scroll `lines` into the history.
    pub fn scroll_up(&mut self, lines: u32) {
        self.scroll(Scroll::Delta(lines.min(i32::MAX as u32) as i32));
    }

    /// Scroll `lines` back towards the live screen.
    pub fn scroll_down(&mut self, lines: u32) {
        self.scroll(Scroll::Delta(-(lines.min(i32::MAX as u32) as i32)));
    }

    pub fn page_up(&mut self) {
        self.scroll(Scroll::PageUp);
    }

    pub fn page_down(&mut self) {
        self.scroll(Scroll::PageDown);
    }

    /// Jump back to the live screen.
    pub fn scroll_reset(&mut self) {
        self.scroll(Scroll::Bottom);
    }

    fn scroll(&mut self, scroll: Scroll) {
        let before = self.display_offset();
        self.term.scroll_display(scroll);
        if self.display_offset() != before {
            self.reset = true;
            tracing::trace!(offset = self.display_offset(), "viewport scrolled");
        }
    }

    /// Lines the viewport is scrolled back into the history.
    pub fn display_offset(&self) -> usize {
        self.term.grid().display_offset()
    }

    /// Lines currently held in the history.
    pub fn scrollback_lines(&self) -> usize {
        self.term.grid().history_size()
    }

    /// Text of viewport row `row`, without trailing blanks.
    pub fn row_text(&self, row: u32) -> String {
        let (cols, rows) = self.size();
        if row >= rows {
            return String::new();
        }
        let grid = self.term.grid();
        let line = &grid[Line(row as i32 - self.display_offset() as i32)];
        let mut text = String::new();
        for col in 0..cols as usize {
            let cell = &line[Column(col)];
            if cell.flags.contains(Flags::WIDE_CHAR_SPACER) {
                continue;
            }
            text.push(if cell.c == '\0' { ' ' } else { cell.c });
        }
        text.truncate(text.trim_end().len());
        text
    }

    #[cfg(test)]
    pub(crate) fn set_age(&mut self, age: Age) {
        self.age = age;
    }
}

impl Screen for TerminalScreen {
    fn draw(&mut self, visit: &mut dyn FnMut(&CellVisit<'_>)) -> Age {
        let age = self.age;
        let reset = std::mem::take(&mut self.reset);
        if reset {
            self.shadow.clear();
        }

        let palette = self.palette();
        let rows = self.term.screen_lines();
        let content = self.term.renderable_content();
        let offset = content.display_offset as i32;
        let cursor = (content.cursor.shape != CursorShape::Hidden).then_some(content.cursor.point);
        let mut codepoints = std::mem::take(&mut self.scratch);

        for indexed in content.display_iter {
            let flags = indexed.flags;
            // Covered by the wide cell to its left. A leading spacer (the
            // last column before a wrapped wide char) is painted like a blank.
            if flags.contains(Flags::WIDE_CHAR_SPACER) {
                continue;
            }
            let line = indexed.point.line.0 + offset;
            if line < 0 || line as usize >= rows {
                continue;
            }
            let (col, row) = (indexed.point.column.0 as u32, line as u32);

            codepoints.clear();
            let zerowidth = indexed.zerowidth().unwrap_or(&[]);
            let blank = flags.contains(Flags::LEADING_WIDE_CHAR_SPACER)
                || (matches!(indexed.c, ' ' | '\0') && zerowidth.is_empty());
            if !blank && !flags.contains(Flags::HIDDEN) {
                codepoints.push(indexed.c as u32);
                codepoints.extend(zerowidth.iter().map(|&c| c as u32));
            }

            let cell_width = if flags.contains(Flags::WIDE_CHAR) { 2 } else { 1 };
            let mut fg = palette.resolve(indexed.fg);
            if flags.contains(Flags::DIM) {
                fg = dim(fg);
            }
            let bg = palette.resolve(indexed.bg);
            let attr = CellAttr {
                inverse: flags.contains(Flags::INVERSE) != (cursor == Some(indexed.point)),
                ..CellAttr::new(fg, bg)
            };

            let changed = self.shadow.observe(
                col as usize,
                row as usize,
                &codepoints,
                cell_width,
                attr,
                age,
            );

            visit(&CellVisit {
                id: cluster_id(&codepoints),
                codepoints: &codepoints,
                cell_width,
                col,
                row,
                attr,
                age: if reset { 0 } else { changed },
            });
        }

        self.scratch = codepoints;

        self.age = age.wrapping_add(1);
        if self.age == 0 {
            // Ages stored before the wrap would look newer than every
            // watermark after it.
            self.age = 1;
            self.reset = true;
        }

        age
    }

    fn columns(&self) -> u32 {
        self.term.columns() as u32
    }

    fn rows(&self) -> u32 {
        self.term.screen_lines() as u32
    }
}

fn term_size(cols: u32, rows: u32) -> Result<TermSize> {
    if cols == 0 || rows == 0 {
        return Err(TermError::InvalidSize { cols, rows });
    }
    Ok(TermSize::new(cols as usize, rows as usize))
}
