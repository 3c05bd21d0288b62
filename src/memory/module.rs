// Fri Jan 16 2026 - Alex

use crate::memory::{Address, MemoryRange};
use std::fmt;
use std::path::{Path, PathBuf};

/// A module (executable image) loaded in the target.
///
/// Two modules are equal when they share a base address; comparing
/// modules from different targets is meaningless.
#[derive(Debug, Clone)]
pub struct Module {
    pub base: Address,
    pub size: u32,
    pub path: Option<PathBuf>,
}

impl Module {
    pub fn new(base: Address, size: u32) -> Self {
        Self { base, size, path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn name(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn range(&self) -> MemoryRange {
        MemoryRange::from_module(self)
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.range().contains(addr)
    }

    /// Turns an RVA into an absolute address inside this module.
    pub fn rebase(&self, rva: u32) -> Address {
        self.base + rva
    }

    /// Turns an absolute address back into an RVA.
    pub fn debase(&self, addr: Address) -> u32 {
        addr - self.base
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl Eq for Module {}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} @ {} (0x{:X} bytes)", name, self.base, self.size),
            None => write!(f, "<anonymous> @ {} (0x{:X} bytes)", self.base, self.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_path() {
        let module = Module::new(Address::new(0x400000), 0x10000).with_path("/games/bin/client.exe");
        assert_eq!(module.name().as_deref(), Some("client.exe"));
        assert_eq!(Module::new(Address::new(0x400000), 0x10).name(), None);
    }

    #[test]
    fn test_equality_by_base() {
        let a = Module::new(Address::new(0x400000), 0x10000).with_path("a.exe");
        let b = Module::new(Address::new(0x400000), 0x20000);
        assert_eq!(a, b);
        assert_ne!(a, Module::new(Address::new(0x10000000), 0x10000));
    }

    #[test]
    fn test_rebase_roundtrip() {
        let module = Module::new(Address::new(0x400000), 0x10000);
        assert_eq!(module.rebase(0x1234), Address::new(0x401234));
        assert_eq!(module.debase(Address::new(0x401234)), 0x1234);
    }
}
