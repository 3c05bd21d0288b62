// Tue Jan 15 2026 - Alex

pub mod analysis;
pub mod config;
pub mod disasm;
pub mod image;
pub mod memory;
pub mod pattern;
pub mod utils;

pub use analysis::{AnalysisError, CodeAnalyzer};
pub use config::Config;
pub use disasm::{decode, decode_at, Instruction, InstructionFlags};
pub use image::ImageLayout;
pub use memory::{Address, Module, SnapshotMemory, TargetMemory};
pub use pattern::{Pattern, PatternScanner, ScanOptions, ScanOutcome};
