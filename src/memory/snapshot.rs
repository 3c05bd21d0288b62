// Fri Jan 16 2026 - Alex

use crate::image::{ImageError, ImageLayout};
use crate::memory::{
    Address, MemoryError, MemoryRange, MemoryRegion, Module, Protection, RegionState, TargetMemory,
};
use std::path::Path;

const PAGE_SIZE: u32 = 0x1000;

/// Top of the user address space of a 32-bit process.
pub const DEFAULT_ADDRESS_LIMIT: u64 = 0x8000_0000;

#[derive(Debug, Clone)]
struct Chunk {
    base: Address,
    size: u32,
    data: Option<Vec<u8>>,
    protection: Protection,
}

impl Chunk {
    fn end(&self) -> u64 {
        self.base.as_u64() + self.size as u64
    }

    fn contains(&self, addr: Address) -> bool {
        addr >= self.base && addr.as_u64() < self.end()
    }

    fn is_readable(&self) -> bool {
        self.data.is_some() && !self.protection.intersects(Protection::NOACCESS | Protection::GUARD)
    }
}

/// A target held entirely in memory.
///
/// Useful for offline analysis of an image file and as a stand-in for a
/// live process. Region queries behave like the Windows ones: gaps between
/// mappings are reported as free regions and queries at or above the
/// address limit fail.
#[derive(Debug, Clone)]
pub struct SnapshotMemory {
    chunks: Vec<Chunk>,
    modules: Vec<Module>,
    address_limit: u64,
}

impl SnapshotMemory {
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            modules: Vec::new(),
            address_limit: DEFAULT_ADDRESS_LIMIT,
        }
    }

    pub fn with_address_limit(mut self, limit: u64) -> Self {
        self.address_limit = limit;
        self
    }

    /// Maps committed memory holding `data` at `base`.
    pub fn map(self, base: Address, data: Vec<u8>, protection: Protection) -> Self {
        let size = data.len() as u32;
        self.insert(Chunk { base, size, data: Some(data), protection })
    }

    /// Reserves address space without committing it.
    pub fn reserve(self, base: Address, size: u32) -> Self {
        self.insert(Chunk { base, size, data: None, protection: Protection::NOACCESS })
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    fn insert(mut self, chunk: Chunk) -> Self {
        let at = self.chunks.partition_point(|c| c.base < chunk.base);
        self.chunks.insert(at, chunk);
        self
    }

    /// Maps a PE32 file image at its preferred base, the way the loader would.
    pub fn from_image(bytes: &[u8], path: Option<&Path>) -> Result<Self, ImageError> {
        let layout = ImageLayout::parse(bytes)?;
        let base = Address::new(layout.image_base);
        let alignment = layout.section_alignment.max(PAGE_SIZE);

        let header_len = (layout.size_of_headers as usize).min(bytes.len());
        let mut headers = bytes[..header_len].to_vec();
        headers.resize(Address::new(layout.size_of_headers.max(1)).align_up(PAGE_SIZE).as_u32() as usize, 0);
        let mut snapshot = Self::new().map(base, headers, Protection::READONLY);

        for section in layout.sections() {
            let span = section.virtual_size.max(section.raw_size);
            if span == 0 {
                continue;
            }
            let mapped = Address::new(span).align_up(alignment).as_u32();
            let start = (section.raw_offset as usize).min(bytes.len());
            let end = (start + section.raw_size as usize).min(bytes.len());
            let mut data = bytes[start..end].to_vec();
            data.resize(mapped as usize, 0);

            log::debug!("mapping {} at {} ({})", section.name, base + section.virtual_address, section.protection());
            snapshot = snapshot.map(base + section.virtual_address, data, section.protection());
        }

        let mut module = Module::new(base, layout.size_of_image);
        if let Some(path) = path {
            module = module.with_path(path);
        }
        Ok(snapshot.with_module(module))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path.as_ref()).map_err(MemoryError::Io)?;
        Self::from_image(&bytes, Some(path.as_ref()))
    }

    fn chunk_at(&self, addr: Address) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.contains(addr))
    }
}

impl Default for SnapshotMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetMemory for SnapshotMemory {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let failed = || MemoryError::ReadFailed { address: addr, len };
        if addr.as_u64() + len as u64 > 1 << 32 {
            return Err(failed());
        }

        let mut out = Vec::with_capacity(len);
        let mut cursor = addr;
        while out.len() < len {
            let chunk = self.chunk_at(cursor).filter(|c| c.is_readable()).ok_or_else(failed)?;
            let data = chunk.data.as_deref().ok_or_else(failed)?;
            let from = (cursor - chunk.base) as usize;
            let take = (len - out.len()).min(data.len() - from);
            out.extend_from_slice(&data[from..from + take]);
            cursor = cursor + take as u32;
        }
        Ok(out)
    }

    fn query_region(&self, addr: Address) -> Result<MemoryRegion, MemoryError> {
        if addr.as_u64() >= self.address_limit {
            return Err(MemoryError::RegionQueryFailed(addr));
        }
        let page = addr.align_down(PAGE_SIZE);

        if let Some(chunk) = self.chunk_at(addr) {
            let start = page.max(chunk.base);
            let state = if chunk.data.is_some() { RegionState::COMMIT } else { RegionState::RESERVE };
            return Ok(MemoryRegion::new(MemoryRange::new(start, chunk.end()), state, chunk.protection));
        }

        let gap_start = self
            .chunks
            .iter()
            .filter(|c| c.end() <= addr.as_u64())
            .map(|c| c.end())
            .max()
            .unwrap_or(0)
            .max(page.as_u64());
        let gap_end = self
            .chunks
            .iter()
            .map(|c| c.base.as_u64())
            .filter(|&b| b > addr.as_u64())
            .min()
            .unwrap_or(self.address_limit.min(1 << 32));

        Ok(MemoryRegion::free(MemoryRange::new(Address::new(gap_start as u32), gap_end)))
    }

    fn modules(&self) -> Result<Vec<Module>, MemoryError> {
        Ok(self.modules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::testing::Pe32Builder;

    fn sample() -> SnapshotMemory {
        SnapshotMemory::new()
            .map(Address::new(0x10000), vec![0xAA; 0x1000], Protection::READWRITE)
            .map(Address::new(0x11000), vec![0xBB; 0x1000], Protection::READONLY)
            .reserve(Address::new(0x20000), 0x2000)
    }

    #[test]
    fn test_read_spans_adjacent_mappings() {
        let mem = sample();
        let bytes = mem.read_bytes(Address::new(0x10FFE), 4).unwrap();
        assert_eq!(bytes, vec![0xAA, 0xAA, 0xBB, 0xBB]);
    }

    #[test]
    fn test_read_fails_on_gap_and_reserve() {
        let mem = sample();
        assert!(mem.read_bytes(Address::new(0x11FFF), 2).is_err());
        assert!(mem.read_u8(Address::new(0x20000)).is_err());
    }

    #[test]
    fn test_query_reports_free_gaps() {
        let mem = sample();
        let region = mem.query_region(Address::new(0x12345)).unwrap();
        assert_eq!(region.state(), RegionState::FREE);
        assert_eq!(region.base(), Address::new(0x12000));
        assert_eq!(region.end(), 0x20000);

        let reserved = mem.query_region(Address::new(0x20010)).unwrap();
        assert_eq!(reserved.state(), RegionState::RESERVE);
        assert!(!reserved.is_accessible());
    }

    #[test]
    fn test_query_starts_at_page_of_address() {
        let mem = sample();
        let region = mem.query_region(Address::new(0x10800)).unwrap();
        assert_eq!(region.base(), Address::new(0x10000));
        assert_eq!(region.end(), 0x11000);
        assert!(region.is_accessible());
    }

    #[test]
    fn test_query_beyond_limit_fails() {
        let mem = sample().with_address_limit(0x30000);
        assert!(mem.query_region(Address::new(0x30000)).is_err());
        let last = mem.query_region(Address::new(0x22000)).unwrap();
        assert_eq!(last.end(), 0x30000);
    }

    #[test]
    fn test_from_image_maps_sections() {
        let image = Pe32Builder::new(0x400000)
            .section(".text", 0x1000, vec![0x55, 0x8B, 0xEC, 0xC3], 0x6000_0020)
            .section(".rdata", 0x2000, b"abc\0".to_vec(), 0x4000_0040)
            .build();
        let mem = SnapshotMemory::from_image(&image, Some(Path::new("game.exe"))).unwrap();

        assert_eq!(mem.read_bytes(Address::new(0x401000), 3).unwrap(), vec![0x55, 0x8B, 0xEC]);
        assert_eq!(mem.read_bytes(Address::new(0x400000), 2).unwrap(), b"MZ".to_vec());
        assert_eq!(mem.query_region(Address::new(0x401000)).unwrap().protection(), Protection::EXECUTE_READ);

        let module = mem.main_module().unwrap();
        assert_eq!(module.base, Address::new(0x400000));
        assert_eq!(module.name().as_deref(), Some("game.exe"));
        assert_eq!(mem.static_address(Address::new(0x402001)).unwrap().as_deref(), Some("game.exe+0x2001"));
    }
}
