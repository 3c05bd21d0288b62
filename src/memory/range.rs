// Tue Jan 13 2026 - Alex

use crate::image::Section;
use crate::memory::{Address, Module};
use std::fmt;

/// A half-open range `[start, end)` of virtual memory.
///
/// `end` is kept as a `u64` so a range can reach the very top of the
/// 32-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRange {
    start: Address,
    end: u64,
}

impl MemoryRange {
    pub fn new(start: Address, end: u64) -> Self {
        Self { start, end: end.max(start.as_u64()) }
    }

    pub fn from_start_size(start: Address, size: u32) -> Self {
        Self::new(start, start.as_u64() + size as u64)
    }

    pub fn from_module(module: &Module) -> Self {
        Self::from_start_size(module.base, module.size)
    }

    /// Range covered by a section once its image is mapped at `module.base`.
    pub fn from_section(module: &Module, section: &Section) -> Self {
        Self::from_start_size(module.base + section.virtual_address, section.virtual_size)
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn size(&self) -> u64 {
        self.end - self.start.as_u64()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr.as_u64() < self.end
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.as_u64() < other.end && self.end > other.start.as_u64()
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start.as_u64() < end {
            Some(Self::new(start, end))
        } else {
            None
        }
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, 0x{:08X})", self.start, self.end)
    }
}
