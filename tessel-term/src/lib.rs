//! Tessel Term - headless VT state exposed as a renderable screen.
//!
//! This crate wraps alacritty_terminal to parse ANSI escape sequences and
//! hands the visible cells to `tessel_render::draw`, tagging each one with
//! the age of the frame that last changed it.

mod error;
mod palette;
mod screen;
mod shadow;

pub use error::{Result, TermError};
pub use palette::{DEFAULT_BG, DEFAULT_FG, Palette, Rgb8};
pub use screen::{DEFAULT_SCROLLBACK, TerminalScreen};
