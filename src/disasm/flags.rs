// Thu Jan 15 2026 - Alex

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Shape and error flags of a decoded instruction.
    ///
    /// The high byte mirrors the legacy prefixes that were present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstructionFlags: u32 {
        const MODRM = 0x0000_0001;
        const SIB = 0x0000_0002;
        const IMM8 = 0x0000_0004;
        const IMM16 = 0x0000_0008;
        const IMM32 = 0x0000_0010;
        const DISP8 = 0x0000_0020;
        const DISP16 = 0x0000_0040;
        const DISP32 = 0x0000_0080;
        const RELATIVE = 0x0000_0100;
        const IMM16_PAIR = 0x0000_0800;
        const ERROR = 0x0000_1000;
        const ERROR_OPCODE = 0x0000_2000;
        const ERROR_LENGTH = 0x0000_4000;
        const ERROR_LOCK = 0x0000_8000;
        const ERROR_OPERAND = 0x0001_0000;
        const PREFIX_REPNZ = 0x0100_0000;
        const PREFIX_REP = 0x0200_0000;
        const PREFIX_66 = 0x0400_0000;
        const PREFIX_67 = 0x0800_0000;
        const PREFIX_LOCK = 0x1000_0000;
        const PREFIX_SEG = 0x2000_0000;

        const PREFIX_ANY = Self::PREFIX_REPNZ.bits()
            | Self::PREFIX_REP.bits()
            | Self::PREFIX_66.bits()
            | Self::PREFIX_67.bits()
            | Self::PREFIX_LOCK.bits()
            | Self::PREFIX_SEG.bits();
        const ERROR_ANY = Self::ERROR.bits()
            | Self::ERROR_OPCODE.bits()
            | Self::ERROR_LENGTH.bits()
            | Self::ERROR_LOCK.bits()
            | Self::ERROR_OPERAND.bits();
    }
}

impl InstructionFlags {
    /// Flags carried by the legacy prefix bitmask.
    pub(crate) fn from_prefixes(prefixes: u8) -> Self {
        Self::from_bits_truncate((prefixes as u32) << 23)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(name, _)| !name.ends_with("_ANY"))
            .map(|(name, _)| name)
            .collect()
    }
}

impl fmt::Display for InstructionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

impl Serialize for InstructionFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// Segment named by an override prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Segment {
    Es,
    Cs,
    Ss,
    Ds,
    Fs,
    Gs,
}

impl Segment {
    pub fn from_prefix(byte: u8) -> Option<Self> {
        match byte {
            0x26 => Some(Segment::Es),
            0x2E => Some(Segment::Cs),
            0x36 => Some(Segment::Ss),
            0x3E => Some(Segment::Ds),
            0x64 => Some(Segment::Fs),
            0x65 => Some(Segment::Gs),
            _ => None,
        }
    }

    pub fn prefix(&self) -> u8 {
        match self {
            Segment::Es => 0x26,
            Segment::Cs => 0x2E,
            Segment::Ss => 0x36,
            Segment::Ds => 0x3E,
            Segment::Fs => 0x64,
            Segment::Gs => 0x65,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Es => "es",
            Segment::Cs => "cs",
            Segment::Ss => "ss",
            Segment::Ds => "ds",
            Segment::Fs => "fs",
            Segment::Gs => "gs",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disasm::table::{PRE_F2, PRE_LOCK, PRE_SEG};

    #[test]
    fn test_prefix_bits() {
        assert_eq!(InstructionFlags::from_prefixes(PRE_F2), InstructionFlags::PREFIX_REPNZ);
        assert_eq!(
            InstructionFlags::from_prefixes(PRE_LOCK | PRE_SEG),
            InstructionFlags::PREFIX_LOCK | InstructionFlags::PREFIX_SEG
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(InstructionFlags::empty().to_string(), "-");
        assert_eq!((InstructionFlags::IMM32 | InstructionFlags::RELATIVE).to_string(), "IMM32 | RELATIVE");
    }

    #[test]
    fn test_segment_roundtrip() {
        for byte in [0x26, 0x2E, 0x36, 0x3E, 0x64, 0x65] {
            assert_eq!(Segment::from_prefix(byte).map(|s| s.prefix()), Some(byte));
        }
        assert!(Segment::from_prefix(0x66).is_none());
    }
}
