// Tue Jan 13 2026 - Alex

pub mod analyzer;
pub mod error;

pub use analyzer::{CodeAnalyzer, FunctionBounds};
pub use error::AnalysisError;
