// Tue Jan 13 2026 - Alex

pub mod address;
pub mod error;
pub mod module;
pub mod protection;
pub mod range;
pub mod region;
pub mod snapshot;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod process;

pub use address::Address;
pub use error::MemoryError;
pub use module::Module;
pub use protection::{Protection, RegionState};
pub use range::MemoryRange;
pub use region::MemoryRegion;
pub use snapshot::SnapshotMemory;
pub use traits::TargetMemory;

#[cfg(target_os = "linux")]
pub use process::ProcessMemory;
