//! Terminal error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermError {
    #[error("invalid terminal size: {cols}x{rows}")]
    InvalidSize { cols: u32, rows: u32 },
}

pub type Result<T> = std::result::Result<T, TermError>;
