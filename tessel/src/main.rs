//! Tessel - render terminal output headlessly.
//!
//! Feeds a byte stream through a VT, composes frames with the glyph-caching
//! rasterizer and writes the final frame as a PNG.

use std::io::Read;

use anyhow::Context;
use clap::Parser;

use tessel::cli::Cli;
use tessel::config::{Config, Input};
use tessel::logging;
use tessel::term::Terminal;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::from_cli(&cli);
    tracing::info!(input = ?config.input, output = %config.output.display(), "Starting tessel");

    let mut term = Terminal::new(&config)?;

    match &config.input {
        Input::Exec(command) => {
            term.spawn(command)?;
            match term.pump() {
                Some(0) => {}
                Some(code) => tracing::warn!(code, command, "command exited with failure"),
                None => tracing::warn!(command, "command output ended without exit status"),
            }
        }
        Input::File(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            term.feed(&bytes);
        }
        Input::Stdin => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read stdin")?;
            term.feed(&bytes);
        }
    }

    for frame in 0..config.frames {
        let stats = term.redraw();
        tracing::info!(frame, drawn = stats.drawn, skipped = stats.skipped, "frame drawn");
    }

    term.save_png(&config.output)?;
    tracing::info!(
        glyphs = term.face().cached_glyphs(),
        path = %config.output.display(),
        "frame written"
    );

    Ok(())
}
