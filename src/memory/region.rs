// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryRange, Protection, RegionState};
use std::fmt;

/// Snapshot of one region as reported by a region query.
///
/// The snapshot may go stale as soon as the target remaps memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    range: MemoryRange,
    state: RegionState,
    protection: Protection,
}

impl MemoryRegion {
    pub fn new(range: MemoryRange, state: RegionState, protection: Protection) -> Self {
        Self { range, state, protection }
    }

    pub fn free(range: MemoryRange) -> Self {
        Self::new(range, RegionState::FREE, Protection::NOACCESS)
    }

    pub fn range(&self) -> &MemoryRange {
        &self.range
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub fn base(&self) -> Address {
        self.range.start()
    }

    pub fn end(&self) -> u64 {
        self.range.end()
    }

    pub fn size(&self) -> u64 {
        self.range.size()
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.range.contains(addr)
    }

    pub fn is_committed(&self) -> bool {
        self.state.contains(RegionState::COMMIT)
    }

    /// Committed and not blocked by `NOACCESS`, `GUARD` or `NOCACHE`.
    pub fn is_accessible(&self) -> bool {
        self.is_committed() && !self.protection.is_blocked()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.state.contains(RegionState::COMMIT) {
            "commit"
        } else if self.state.contains(RegionState::RESERVE) {
            "reserve"
        } else {
            "free"
        };
        write!(f, "{} {} {}", self.range, state, self.protection)
    }
}
