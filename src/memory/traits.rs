// Wed Jan 15 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryRegion, Module};

/// Access to the memory of a target process.
///
/// Implementations are thin wrappers over whatever primitive the platform
/// offers. All reads are blocking.
pub trait TargetMemory: Send + Sync {
    /// Reads exactly `len` bytes; a short read is an error.
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    /// Describes the region containing `addr`, starting the reported
    /// region at the page of `addr`. Fails once no more regions exist.
    fn query_region(&self, addr: Address) -> Result<MemoryRegion, MemoryError>;

    /// Point-in-time list of loaded modules, main module first.
    fn modules(&self) -> Result<Vec<Module>, MemoryError>;

    /// Fills as much of `buf` as can be read and returns the byte count.
    fn read_into(&self, addr: Address, buf: &mut [u8]) -> Result<usize, MemoryError> {
        let data = self.read_bytes(addr, buf.len())?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn main_module(&self) -> Result<Module, MemoryError> {
        self.modules()?
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::ProcessNotFound("target has no modules".to_string()))
    }

    fn module_at(&self, addr: Address) -> Result<Option<Module>, MemoryError> {
        Ok(self.modules()?.into_iter().find(|m| m.contains(addr)))
    }

    fn read_u8(&self, addr: Address) -> Result<u8, MemoryError> {
        Ok(self.read_bytes(addr, 1)?[0])
    }

    fn read_u16(&self, addr: Address) -> Result<u16, MemoryError> {
        let bytes = self.read_bytes(addr, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, addr: Address) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&self, addr: Address) -> Result<i32, MemoryError> {
        Ok(self.read_u32(addr)? as i32)
    }

    /// Renders `addr` as `module+0xRVA` when it falls inside a named module.
    fn static_address(&self, addr: Address) -> Result<Option<String>, MemoryError> {
        Ok(self.module_at(addr)?.and_then(|module| {
            module.name().map(|name| format!("{}+0x{:X}", name, module.debase(addr)))
        }))
    }
}
