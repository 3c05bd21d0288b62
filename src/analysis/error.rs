// Tue Jan 13 2026 - Alex

use crate::image::ImageError;
use crate::memory::{Address, MemoryError};
use crate::pattern::PatternError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
    #[error("No module contains address {0}")]
    ModuleNotFound(Address),
    #[error("No section exists called '{0}'")]
    SectionNotFound(String),
    #[error("String '{string}' not found in module '{module}'")]
    StringNotFound { string: String, module: String },
    #[error("Nothing found within 0x{limit:X} bytes of {start}")]
    SearchExhausted { start: Address, limit: u32 },
}
