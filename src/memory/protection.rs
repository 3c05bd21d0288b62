// Tue Jan 13 2026 - Alex

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Page protection of a region, using the Win32 `PAGE_*` bit values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Protection: u32 {
        const NOACCESS = 0x01;
        const READONLY = 0x02;
        const READWRITE = 0x04;
        const WRITECOPY = 0x08;
        const EXECUTE = 0x10;
        const EXECUTE_READ = 0x20;
        const EXECUTE_READWRITE = 0x40;
        const EXECUTE_WRITECOPY = 0x80;
        const GUARD = 0x100;
        const NOCACHE = 0x200;
        const WRITECOMBINE = 0x400;
    }
}

bitflags! {
    /// Allocation state of a region (`MEM_*` values).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegionState: u32 {
        const COMMIT = 0x1000;
        const RESERVE = 0x2000;
        const FREE = 0x10000;
    }
}

impl Protection {
    pub fn from_rwx(read: bool, write: bool, execute: bool) -> Self {
        match (read, write, execute) {
            (false, false, false) => Self::NOACCESS,
            (true, false, false) => Self::READONLY,
            (_, true, false) => Self::READWRITE,
            (false, false, true) => Self::EXECUTE,
            (true, false, true) => Self::EXECUTE_READ,
            (_, true, true) => Self::EXECUTE_READWRITE,
        }
    }

    pub fn can_read(self) -> bool {
        self.intersects(
            Self::READONLY
                | Self::READWRITE
                | Self::WRITECOPY
                | Self::EXECUTE_READ
                | Self::EXECUTE_READWRITE
                | Self::EXECUTE_WRITECOPY,
        )
    }

    pub fn can_write(self) -> bool {
        self.intersects(Self::READWRITE | Self::WRITECOPY | Self::EXECUTE_READWRITE | Self::EXECUTE_WRITECOPY)
    }

    pub fn can_execute(self) -> bool {
        self.intersects(Self::EXECUTE | Self::EXECUTE_READ | Self::EXECUTE_READWRITE | Self::EXECUTE_WRITECOPY)
    }

    /// Pages that can never be scanned regardless of their base protection.
    pub fn is_blocked(self) -> bool {
        self.intersects(Self::NOACCESS | Self::GUARD | Self::NOCACHE)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.can_read() { 'r' } else { '-' };
        let w = if self.can_write() { 'w' } else { '-' };
        let x = if self.can_execute() { 'x' } else { '-' };
        write!(f, "{}{}{}", r, w, x)?;
        if self.contains(Self::GUARD) {
            write!(f, " guard")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rwx_mapping() {
        assert_eq!(Protection::from_rwx(true, false, true), Protection::EXECUTE_READ);
        assert!(Protection::EXECUTE_READ.can_read());
        assert!(!Protection::EXECUTE_READ.can_write());
        assert!(Protection::WRITECOPY.can_write());
        assert!(!Protection::EXECUTE.can_read());
    }

    #[test]
    fn test_blocked_pages() {
        assert!((Protection::READWRITE | Protection::GUARD).is_blocked());
        assert!(Protection::NOACCESS.is_blocked());
        assert!(!Protection::READONLY.is_blocked());
        assert_eq!(Protection::READWRITE.to_string(), "rw-");
    }
}
