//! Command line.

use std::path::PathBuf;

use clap::Parser;

/// Render terminal output to a PNG with a glyph-caching CPU rasterizer.
#[derive(Debug, Parser)]
#[command(name = "tessel", version)]
pub struct Cli {
    /// Input to feed through the terminal; `-` reads stdin.
    #[arg(value_name = "FILE", conflicts_with = "exec")]
    pub input: Option<PathBuf>,

    /// Run a shell command on a pseudo-terminal and render its output.
    #[arg(long, value_name = "CMD")]
    pub exec: Option<String>,

    /// Where to write the final frame.
    #[arg(short, long, value_name = "PNG", default_value = "tessel.png")]
    pub output: PathBuf,

    /// Font description, e.g. "DejaVu Sans Mono Bold 12".
    #[arg(long, value_name = "DESC", default_value = "monospace")]
    pub font: String,

    /// Font size in pixels, overriding the description.
    #[arg(long, value_name = "PX")]
    pub font_size: Option<u32>,

    #[arg(long)]
    pub bold: bool,

    #[arg(long)]
    pub italic: bool,

    /// Window width in pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Window height in pixels.
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Outline every cell that was repainted in a frame.
    #[arg(long)]
    pub show_dirty: bool,

    /// Round the window size down to a whole number of cells.
    #[arg(long)]
    pub snap_size: bool,

    /// Scrollback size in lines.
    #[arg(long, value_name = "LINES", default_value_t = 2000, allow_hyphen_values = true)]
    pub sb_size: i64,

    /// Number of frames to draw once the input is consumed.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub frames: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
