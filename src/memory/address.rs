// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A 32-bit virtual address in the target process.
///
/// All arithmetic wraps modulo 2^32, the same way the CPU computes
/// effective addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address {
    value: u32,
}

impl Address {
    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    pub const fn zero() -> Self {
        Self { value: 0 }
    }

    pub const fn as_u32(&self) -> u32 {
        self.value
    }

    pub const fn as_u64(&self) -> u64 {
        self.value as u64
    }

    pub fn is_null(&self) -> bool {
        self.value == 0
    }

    pub fn is_aligned(&self, alignment: u32) -> bool {
        alignment == 0 || self.value % alignment == 0
    }

    pub fn align_down(&self, alignment: u32) -> Self {
        if alignment == 0 {
            return *self;
        }
        Self { value: self.value - self.value % alignment }
    }

    pub fn align_up(&self, alignment: u32) -> Self {
        if alignment == 0 || self.value % alignment == 0 {
            return *self;
        }
        Self { value: self.value.wrapping_add(alignment - self.value % alignment) }
    }

    pub fn offset(&self, offset: i32) -> Self {
        Self { value: self.value.wrapping_add_signed(offset) }
    }

    pub fn checked_add(&self, rhs: u32) -> Option<Self> {
        self.value.checked_add(rhs).map(Self::new)
    }

    pub fn distance(&self, other: Self) -> i64 {
        self.value as i64 - other.value as i64
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.value)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.value, f)
    }
}

impl Add<u32> for Address {
    type Output = Self;
    fn add(self, rhs: u32) -> Self::Output {
        Self { value: self.value.wrapping_add(rhs) }
    }
}

impl Sub<u32> for Address {
    type Output = Self;
    fn sub(self, rhs: u32) -> Self::Output {
        Self { value: self.value.wrapping_sub(rhs) }
    }
}

impl Sub<Address> for Address {
    type Output = u32;
    fn sub(self, rhs: Address) -> Self::Output {
        self.value.wrapping_sub(rhs.value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Address> for u32 {
    fn from(addr: Address) -> Self {
        addr.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_arithmetic() {
        let addr = Address::new(0xFFFF_FFF0);
        assert_eq!(addr + 0x20, Address::new(0x10));
        assert_eq!(Address::new(0x10) - 0x20, Address::new(0xFFFF_FFF0));
        assert_eq!(Address::new(0x1000).offset(-0x10), Address::new(0xFF0));
    }

    #[test]
    fn test_alignment() {
        let addr = Address::new(0x401005);
        assert_eq!(addr.align_down(16), Address::new(0x401000));
        assert_eq!(addr.align_up(16), Address::new(0x401010));
        assert_eq!(Address::new(0x401010).align_up(16), Address::new(0x401010));
        assert!(!addr.is_aligned(16));
    }
}
