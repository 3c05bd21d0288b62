// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read of {len} bytes failed at address {address}")]
    ReadFailed { address: Address, len: usize },
    #[error("Region query failed at address {0}")]
    RegionQueryFailed(Address),
    #[error("Process not found: {0}")]
    ProcessNotFound(String),
}
