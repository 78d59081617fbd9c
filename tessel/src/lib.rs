//! Tessel - headless terminal front end.
//!
//! Wires a [`tessel_term::TerminalScreen`] to the `tessel_render` draw
//! driver and writes frames as PNG files.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pty;
pub mod term;
