// Thu Jan 15 2026 - Alex

use serde::Serialize;
use std::fmt;

/// A 4-byte cell read as an 8, 16 or 32-bit quantity.
///
/// Narrow views read the leading bytes of the cell in little-endian order,
/// which is the byte order of the decoded instruction set. Narrow setters
/// only touch the bytes of their own width.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
pub struct Value {
    bytes: [u8; 4],
}

impl Value {
    pub fn new(value: u32) -> Self {
        Self { bytes: value.to_le_bytes() }
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.bytes
    }

    pub fn u8(&self) -> u8 {
        self.bytes[0]
    }

    pub fn u16(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn u32(&self) -> u32 {
        u32::from_le_bytes(self.bytes)
    }

    pub fn i8(&self) -> i8 {
        self.u8() as i8
    }

    pub fn i16(&self) -> i16 {
        self.u16() as i16
    }

    pub fn i32(&self) -> i32 {
        self.u32() as i32
    }

    pub fn set_u8(&mut self, value: u8) {
        self.bytes[0] = value;
    }

    pub fn set_u16(&mut self, value: u16) {
        self.bytes[..2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_u32(&mut self, value: u32) {
        self.bytes = value.to_le_bytes();
    }
}

impl From<Value> for u32 {
    fn from(value: Value) -> Self {
        value.u32()
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value(0x{:08X})", self.u32())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_share_storage() {
        let value = Value::new(0x8000_FFFE);
        assert_eq!(value.u8(), 0xFE);
        assert_eq!(value.i8(), -2);
        assert_eq!(value.u16(), 0xFFFE);
        assert_eq!(value.i16(), -2);
        assert_eq!(value.i32(), i32::MIN + 0xFFFE);
    }

    #[test]
    fn test_narrow_setters_keep_upper_bytes() {
        let mut value = Value::new(0x1122_3344);
        value.set_u8(0xAA);
        assert_eq!(value.u32(), 0x1122_33AA);
        value.set_u16(0xBBCC);
        assert_eq!(value.u32(), 0x1122_BBCC);
        value.set_u32(1);
        assert_eq!(value.as_bytes(), &[1, 0, 0, 0]);
    }
}
