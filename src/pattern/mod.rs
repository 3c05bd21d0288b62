// Tue Jan 13 2026 - Alex

pub mod error;
pub mod options;
pub mod pattern;
pub mod scanner;

pub use error::PatternError;
pub use options::ScanOptions;
pub use pattern::{Pattern, RawValue};
pub use scanner::{PatternScanner, ScanCompletion, ScanOutcome};
