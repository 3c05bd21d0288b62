// Fri Jan 16 2026 - Alex

pub mod error;
pub mod layout;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ImageError;
pub use layout::{ImageLayout, Section};
