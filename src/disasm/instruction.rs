// Thu Jan 15 2026 - Alex

use crate::disasm::flags::{InstructionFlags, Segment};
use crate::disasm::value::Value;
use crate::memory::Address;
use serde::Serialize;
use std::fmt;

/// Length and shape of one decoded instruction.
///
/// Only the fields needed to measure an instruction and pull pointers or
/// offsets out of it are filled in; there is no operand naming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub size: u8,
    pub flags: InstructionFlags,
    pub segment: Option<Segment>,
    /// Primary opcode byte; `0x0F` for two-byte opcodes.
    pub opcode: u8,
    pub opcode2: Option<u8>,
    pub modrm: u8,
    pub modrm_mod: u8,
    pub modrm_reg: u8,
    pub modrm_rm: u8,
    pub sib: u8,
    pub sib_scale: u8,
    pub sib_index: u8,
    pub sib_base: u8,
    pub imm: Value,
    pub disp: Value,
}

impl Instruction {
    pub fn len(&self) -> usize {
        self.size as usize
    }

    pub fn is_error(&self) -> bool {
        self.flags.contains(InstructionFlags::ERROR)
    }

    pub fn is_two_byte(&self) -> bool {
        self.opcode2.is_some()
    }

    pub fn has_modrm(&self) -> bool {
        self.flags.contains(InstructionFlags::MODRM)
    }

    pub fn has_sib(&self) -> bool {
        self.flags.contains(InstructionFlags::SIB)
    }

    pub fn is_relative(&self) -> bool {
        self.flags.contains(InstructionFlags::RELATIVE)
    }

    pub fn segment(&self) -> Option<Segment> {
        self.segment
    }

    /// `(secondary << 8) | primary` for two-byte opcodes, else the primary byte.
    pub fn opcode_word(&self) -> u16 {
        match self.opcode2 {
            Some(secondary) => (secondary as u16) << 8 | self.opcode as u16,
            None => self.opcode as u16,
        }
    }

    /// Sign-extended displacement of a relative branch.
    pub fn relative_offset(&self) -> Option<i32> {
        if !self.is_relative() {
            return None;
        }
        if self.flags.contains(InstructionFlags::IMM32) {
            Some(self.imm.i32())
        } else if self.flags.contains(InstructionFlags::IMM16) {
            Some(self.imm.i16() as i32)
        } else {
            Some(self.imm.i8() as i32)
        }
    }

    /// Target of a relative branch located at `addr`.
    pub fn branch_target(&self, addr: Address) -> Option<Address> {
        self.relative_offset()
            .map(|rel| (addr + self.size as u32).offset(rel))
    }

    /// Displacement of the memory operand, sign-extended.
    pub fn displacement(&self) -> Option<i32> {
        if self.flags.contains(InstructionFlags::DISP32) {
            Some(self.disp.i32())
        } else if self.flags.contains(InstructionFlags::DISP16) {
            Some(self.disp.i16() as i32)
        } else if self.flags.contains(InstructionFlags::DISP8) {
            Some(self.disp.i8() as i32)
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode2 {
            Some(secondary) => write!(f, "{:02X} {:02X}", self.opcode, secondary)?,
            None => write!(f, "{:02X}", self.opcode)?,
        }
        write!(f, " len={} [{}]", self.size, self.flags)
    }
}
