// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern has {bytes} bytes but a mask of {mask}")]
    LengthMismatch { bytes: usize, mask: usize },
    #[error("Invalid pattern token: {0}")]
    InvalidToken(String),
    #[error("Pattern is empty")]
    Empty,
    #[error("Invalid scan alignment: {0}")]
    InvalidAlignment(usize),
}
