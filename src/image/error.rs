// Fri Jan 16 2026 - Alex

use crate::memory::MemoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image parse error: {0}")]
    Parse(String),
    #[error("Image is not a PE32 executable")]
    NotPe32,
    #[error("Unsupported machine type: 0x{0:04X}")]
    UnsupportedMachine(u16),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl From<goblin::error::Error> for ImageError {
    fn from(err: goblin::error::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
