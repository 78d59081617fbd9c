//! Color resolution for terminal cells.

use alacritty_terminal::term::color::Colors;
use alacritty_terminal::vte::ansi::{Color as AnsiColor, NamedColor};
use tessel_render::{CellAttr, Vte};

/// An 8-bit RGB triple.
pub type Rgb8 = (u8, u8, u8);

pub const DEFAULT_FG: Rgb8 = (229, 229, 229);
pub const DEFAULT_BG: Rgb8 = (0, 0, 0);

/// The 256 indexed colors plus default foreground and background, with any
/// OSC overrides the program applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    indexed: [Rgb8; 256],
    fg: Rgb8,
    bg: Rgb8,
}

impl Palette {
    /// The stock xterm-256 palette.
    pub fn xterm() -> Self {
        let mut indexed = [(0, 0, 0); 256];
        for (i, slot) in indexed.iter_mut().enumerate() {
            *slot = xterm_color(i as u8);
        }
        Self {
            indexed,
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
        }
    }

    /// Stock palette with the terminal's overrides applied.
    pub(crate) fn with_overrides(colors: &Colors) -> Self {
        let mut palette = Self::xterm();
        for (i, slot) in palette.indexed.iter_mut().enumerate() {
            if let Some(rgb) = colors[i] {
                *slot = (rgb.r, rgb.g, rgb.b);
            }
        }
        if let Some(rgb) = colors[NamedColor::Foreground] {
            palette.fg = (rgb.r, rgb.g, rgb.b);
        }
        if let Some(rgb) = colors[NamedColor::Background] {
            palette.bg = (rgb.r, rgb.g, rgb.b);
        }
        palette
    }

    pub fn foreground(&self) -> Rgb8 {
        self.fg
    }

    pub fn background(&self) -> Rgb8 {
        self.bg
    }

    pub fn indexed(&self, index: u8) -> Rgb8 {
        self.indexed[index as usize]
    }

    /// Resolve a VT color to RGB.
    pub fn resolve(&self, color: AnsiColor) -> Rgb8 {
        match color {
            AnsiColor::Spec(rgb) => (rgb.r, rgb.g, rgb.b),
            AnsiColor::Indexed(index) => self.indexed(index),
            AnsiColor::Named(named) => self.named(named),
        }
    }

    fn named(&self, named: NamedColor) -> Rgb8 {
        let dim_black = NamedColor::DimBlack as usize;
        let index = named as usize;
        match named {
            NamedColor::Foreground | NamedColor::BrightForeground | NamedColor::Cursor => self.fg,
            NamedColor::DimForeground => dim(self.fg),
            NamedColor::Background => self.bg,
            _ if index < 256 => self.indexed[index],
            _ if (dim_black..dim_black + 8).contains(&index) => {
                dim(self.indexed[index - dim_black])
            }
            _ => self.fg,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::xterm()
    }
}

impl Vte for Palette {
    fn default_attr(&self) -> CellAttr {
        CellAttr::new(self.fg, self.bg)
    }
}

/// Two thirds brightness.
pub(crate) fn dim((r, g, b): Rgb8) -> Rgb8 {
    let d = |c: u8| (c as u16 * 2 / 3) as u8;
    (d(r), d(g), d(b))
}

fn xterm_color(index: u8) -> Rgb8 {
    match index {
        0 => (0, 0, 0),       // Black
        1 => (205, 49, 49),   // Red
        2 => (13, 188, 121),  // Green
        3 => (229, 229, 16),  // Yellow
        4 => (36, 114, 200),  // Blue
        5 => (188, 63, 188),  // Magenta
        6 => (17, 168, 205),  // Cyan
        7 => (229, 229, 229), // White
        8 => (102, 102, 102),
        9 => (241, 76, 76),
        10 => (35, 209, 139),
        11 => (245, 245, 67),
        12 => (59, 142, 234),
        13 => (214, 112, 214),
        14 => (41, 184, 219),
        15 => (255, 255, 255),
        // 6x6x6 color cube
        16..=231 => {
            let n = index - 16;
            let level = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            (level(n / 36), level((n / 6) % 6), level(n % 6))
        }
        // Grayscale ramp
        232..=255 => {
            let gray = 8 + (index - 232) * 10;
            (gray, gray, gray)
        }
    }
}
