// Thu Jan 15 2026 - Alex

use crate::disasm::flags::{InstructionFlags, Segment};
use crate::disasm::instruction::Instruction;
use crate::disasm::table::{self, *};
use crate::memory::Address;

/// Architectural limit on the length of one instruction.
pub const MAX_INSTRUCTION_LEN: usize = 15;
const MAX_PREFIXES: usize = 16;

/// Reads forward through a code window. Bytes past the end read as zero,
/// which is the same as decoding from a zero-padded buffer.
struct ByteCursor<'a> {
    code: &'a [u8],
    start: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(code: &'a [u8], start: usize) -> Self {
        Self { code, start, pos: start }
    }

    fn next(&mut self) -> u8 {
        let byte = self.peek();
        self.pos += 1;
        byte
    }

    fn peek(&self) -> u8 {
        self.code.get(self.pos).copied().unwrap_or(0)
    }

    fn next_u16(&mut self) -> u16 {
        u16::from_le_bytes([self.next(), self.next()])
    }

    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([self.next(), self.next(), self.next(), self.next()])
    }

    fn consumed(&self) -> usize {
        self.pos - self.start
    }
}

/// Decodes the instruction at the start of `code`.
pub fn decode(code: &[u8]) -> Instruction {
    decode_at(code, 0)
}

/// Decodes the instruction at `offset` in `code`.
///
/// Never fails: malformed encodings come back with error flags set and a
/// best-effort length.
pub fn decode_at(code: &[u8], offset: usize) -> Instruction {
    let mut cursor = ByteCursor::new(code, offset);
    let mut insn = Instruction::default();
    let mut pref = 0u8;

    let mut byte = 0u8;
    for _ in 0..MAX_PREFIXES {
        byte = cursor.next();
        match byte {
            0xF3 => pref |= PRE_F3,
            0xF2 => pref |= PRE_F2,
            0xF0 => pref |= PRE_LOCK,
            0x26 | 0x2E | 0x36 | 0x3E | 0x64 | 0x65 => {
                pref |= PRE_SEG;
                insn.segment = Segment::from_prefix(byte);
            }
            0x66 => pref |= PRE_66,
            0x67 => pref |= PRE_67,
            _ => break,
        }
    }

    let mut flags = InstructionFlags::from_prefixes(pref);
    if pref == 0 {
        pref |= PRE_NONE;
    }

    insn.opcode = byte;
    let mut map = 0;
    let opcode = if byte == 0x0F {
        let secondary = cursor.next();
        insn.opcode2 = Some(secondary);
        map = DELTA_OPCODES;
        secondary
    } else {
        // mov al/eax <-> moffs: operand size follows the address-size prefix
        if (0xA0..=0xA3).contains(&byte) {
            if pref & PRE_67 != 0 {
                pref |= PRE_66;
            } else {
                pref &= !PRE_66;
            }
        }
        byte
    };
    let two_byte = insn.opcode2.is_some();

    let mut class = table::lookup(map, opcode);
    if class == C_ERROR {
        flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_OPCODE;
        class = if opcode & 0xFD == 0x24 { C_MODRM } else { C_NONE };
    }

    let mut reg_mask = 0u8;
    if class & C_GROUP != 0 {
        let at = map + (class & 0x7F) as usize;
        class = table::byte(at);
        reg_mask = table::byte(at + 1);
    }

    if two_byte && table::lookup(DELTA_PREFIXES, opcode) & pref != 0 {
        flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_OPCODE;
    }

    if class & C_MODRM != 0 {
        flags |= InstructionFlags::MODRM;
        let modrm = cursor.next();
        let mut mode = modrm >> 6;
        let reg = (modrm & 0x3F) >> 3;
        let rm = modrm & 7;
        insn.modrm = modrm;
        insn.modrm_mod = mode;
        insn.modrm_reg = reg;
        insn.modrm_rm = rm;

        if reg_mask != 0 && (reg_mask << reg) & 0x80 != 0 {
            flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_OPCODE;
        }

        if !two_byte && (0xD9..=0xDF).contains(&opcode) {
            let index = (opcode - 0xD9) as usize;
            let invalid = if mode == 3 {
                table::byte(DELTA_FPU_MODRM + index * 8 + reg as usize) << rm
            } else {
                table::byte(DELTA_FPU_REG + index) << reg
            };
            if invalid & 0x80 != 0 {
                flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_OPCODE;
            }
        }

        if pref & PRE_LOCK != 0 && !lock_allowed(two_byte, opcode, mode, reg) {
            flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_LOCK;
        }

        let operand_error = match (two_byte, opcode) {
            // mov to/from control registers
            (true, 0x20 | 0x22) => {
                mode = 3;
                reg > 4 || reg == 1
            }
            // mov to/from debug registers
            (true, 0x21 | 0x23) => {
                mode = 3;
                reg == 4 || reg == 5
            }
            (false, 0x8C) => reg > 5,
            (false, 0x8E) => reg == 1 || reg > 5,
            _ => operand_form_invalid(two_byte, opcode, mode, reg, pref),
        };
        if operand_error {
            flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_OPERAND;
        }

        // test r/m, imm
        if !two_byte && reg <= 1 {
            match opcode {
                0xF6 => class |= C_IMM8,
                0xF7 => class |= C_IMM_P66,
                _ => {}
            }
        }

        let mut disp_size = match mode {
            0 if pref & PRE_67 != 0 && rm == 6 => 2,
            0 if pref & PRE_67 == 0 && rm == 5 => 4,
            1 => 1,
            2 if pref & PRE_67 != 0 => 2,
            2 => 4,
            _ => 0,
        };

        if mode != 3 && rm == 4 && pref & PRE_67 == 0 {
            flags |= InstructionFlags::SIB;
            let sib = cursor.next();
            insn.sib = sib;
            insn.sib_scale = sib >> 6;
            insn.sib_index = (sib & 0x3F) >> 3;
            insn.sib_base = sib & 7;
            if sib & 7 == 5 && mode & 1 == 0 {
                disp_size = 4;
            }
        }

        match disp_size {
            1 => {
                flags |= InstructionFlags::DISP8;
                insn.disp.set_u8(cursor.next());
            }
            2 => {
                flags |= InstructionFlags::DISP16;
                insn.disp.set_u16(cursor.next_u16());
            }
            4 => {
                flags |= InstructionFlags::DISP32;
                insn.disp.set_u32(cursor.next_u32());
            }
            _ => {}
        }
    } else if pref & PRE_LOCK != 0 {
        flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_LOCK;
    }

    decode_immediates(&mut cursor, &mut insn, &mut flags, class, pref);

    let mut size = cursor.consumed();
    if size > MAX_INSTRUCTION_LEN {
        flags |= InstructionFlags::ERROR | InstructionFlags::ERROR_LENGTH;
        size = MAX_INSTRUCTION_LEN;
    }

    insn.size = size as u8;
    insn.flags = flags;
    insn
}

fn decode_immediates(
    cursor: &mut ByteCursor<'_>,
    insn: &mut Instruction,
    flags: &mut InstructionFlags,
    class: u8,
    pref: u8,
) {
    let operand_16 = pref & PRE_66 != 0;

    if class & C_IMM_P66 != 0 {
        if class & C_REL32 != 0 {
            if operand_16 {
                *flags |= InstructionFlags::IMM16 | InstructionFlags::RELATIVE;
                insn.imm.set_u16(cursor.next_u16());
                return;
            }
            *flags |= InstructionFlags::IMM32 | InstructionFlags::RELATIVE;
            insn.imm.set_u32(cursor.next_u32());
            return;
        }
        if operand_16 {
            *flags |= InstructionFlags::IMM16;
            insn.imm.set_u16(cursor.next_u16());
        } else {
            *flags |= InstructionFlags::IMM32;
            insn.imm.set_u32(cursor.next_u32());
        }
    }

    if class & C_IMM16 != 0 {
        // far pointers and ret/enter pairs put the second word in disp
        if flags.contains(InstructionFlags::IMM32) {
            *flags |= InstructionFlags::IMM16;
            insn.disp.set_u16(cursor.next_u16());
        } else if flags.contains(InstructionFlags::IMM16) {
            *flags |= InstructionFlags::IMM16_PAIR;
            insn.disp.set_u16(cursor.next_u16());
        } else {
            *flags |= InstructionFlags::IMM16;
            insn.imm.set_u16(cursor.next_u16());
        }
    }

    if class & C_IMM8 != 0 {
        let imm8 = cursor.next();
        if flags.contains(InstructionFlags::IMM16) && !flags.contains(InstructionFlags::MODRM) {
            // enter: nesting level follows the frame size
            insn.disp.set_u8(imm8);
        } else {
            insn.imm.set_u8(imm8);
        }
        *flags |= InstructionFlags::IMM8;
    }

    if class & C_REL32 != 0 {
        *flags |= InstructionFlags::IMM32 | InstructionFlags::RELATIVE;
        insn.imm.set_u32(cursor.next_u32());
    } else if class & C_REL8 != 0 {
        *flags |= InstructionFlags::IMM8 | InstructionFlags::RELATIVE;
        insn.imm.set_u8(cursor.next());
    }
}

/// Checks a lock prefix against the lockable-opcode lists.
fn lock_allowed(two_byte: bool, opcode: u8, mode: u8, reg: u8) -> bool {
    if mode == 3 {
        return false;
    }
    let (mut at, end, op) = if two_byte {
        (DELTA_OP2_LOCK_OK, DELTA_OP_ONLY_MEM, opcode)
    } else {
        (DELTA_OP_LOCK_OK, DELTA_OP2_LOCK_OK, opcode & 0xFE)
    };
    while at < end {
        if table::byte(at) == op {
            return (table::byte(at + 1) << reg) & 0x80 == 0;
        }
        at += 2;
    }
    false
}

/// Register-only and memory-only operand forms.
fn operand_form_invalid(two_byte: bool, opcode: u8, mode: u8, reg: u8, pref: u8) -> bool {
    if mode == 3 {
        let (mut at, end) = if two_byte {
            (DELTA_OP2_ONLY_MEM, TABLE.len())
        } else {
            (DELTA_OP_ONLY_MEM, DELTA_OP2_ONLY_MEM)
        };
        while at + 2 < end {
            if table::byte(at) == opcode {
                return table::byte(at + 1) & pref != 0 && (table::byte(at + 2) << reg) & 0x80 == 0;
            }
            at += 3;
        }
        return false;
    }

    if !two_byte {
        return false;
    }
    match opcode {
        0x50 | 0xD7 | 0xF7 => pref & (PRE_NONE | PRE_66) != 0,
        0xD6 => pref & (PRE_F2 | PRE_F3) != 0,
        0xC5 => true,
        _ => false,
    }
}

/// Length-decodes consecutive instructions from a code window.
pub struct InstructionIter<'a> {
    code: &'a [u8],
    offset: usize,
    base: Address,
}

impl<'a> InstructionIter<'a> {
    pub fn new(code: &'a [u8], base: Address) -> Self {
        Self { code, offset: 0, base }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for InstructionIter<'a> {
    type Item = (Address, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.code.len() {
            return None;
        }
        let addr = self.base + self.offset as u32;
        let insn = decode_at(self.code, self.offset);
        log::trace!("{} {}", addr, insn);
        self.offset += insn.len().max(1);
        Some((addr, insn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InstructionFlags as F;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
    }

    fn check(code: &str, size: u8, flags: InstructionFlags) -> Instruction {
        let insn = decode(&hex(code));
        assert_eq!(insn.size, size, "length of {}", code);
        assert_eq!(insn.flags, flags, "flags of {}", code);
        insn
    }

    #[test]
    fn test_single_byte_opcodes() {
        for code in ["90", "c3", "cc", "50", "5d", "c9", "f4"] {
            check(code, 1, F::empty());
        }
    }

    #[test]
    fn test_call_rel32() {
        let insn = check("e812345678", 5, F::IMM32 | F::RELATIVE);
        assert_eq!(insn.imm.u32(), 0x7856_3412);
        assert_eq!(insn.opcode_word(), 0xE8);

        let back = check("e8f0ffffff", 5, F::IMM32 | F::RELATIVE);
        assert_eq!(back.branch_target(Address::new(0x401000)), Some(Address::new(0x400FF5)));

        let jmp = check("e9ffffffff", 5, F::IMM32 | F::RELATIVE);
        assert_eq!(jmp.branch_target(Address::new(0x1000)), Some(Address::new(0x1004)));
    }

    #[test]
    fn test_short_branches() {
        let jz = check("7405", 2, F::IMM8 | F::RELATIVE);
        assert_eq!(jz.branch_target(Address::new(0x1000)), Some(Address::new(0x1007)));

        let spin = check("ebfe", 2, F::IMM8 | F::RELATIVE);
        assert_eq!(spin.branch_target(Address::new(0x1000)), Some(Address::new(0x1000)));
    }

    #[test]
    fn test_two_byte_opcodes() {
        let jz = check("0f8401000000", 6, F::IMM32 | F::RELATIVE);
        assert_eq!(jz.opcode, 0x0F);
        assert_eq!(jz.opcode2, Some(0x84));
        assert_eq!(jz.opcode_word(), 0x840F);

        check("0fb6c0", 3, F::MODRM);
        check("0f0b", 2, F::ERROR | F::ERROR_OPCODE);
    }

    #[test]
    fn test_modrm_and_sib() {
        let insn = check("8b448b10", 4, F::MODRM | F::SIB | F::DISP8);
        assert_eq!(insn.modrm_mod, 1);
        assert_eq!(insn.modrm_reg, 0);
        assert_eq!(insn.modrm_rm, 4);
        assert_eq!(insn.sib_scale, 2);
        assert_eq!(insn.sib_index, 1);
        assert_eq!(insn.sib_base, 3);
        assert_eq!(insn.displacement(), Some(0x10));

        check("8bec", 2, F::MODRM);

        let abs = check("8b0d78563412", 6, F::MODRM | F::DISP32);
        assert_eq!(abs.disp.u32(), 0x1234_5678);

        let call = check("ff1544332211", 6, F::MODRM | F::DISP32);
        assert_eq!(call.modrm_reg, 2);
    }

    #[test]
    fn test_immediates() {
        check("6a08", 2, F::IMM8);
        let push = check("68ddccbbaa", 5, F::IMM32);
        assert_eq!(push.imm.u32(), 0xAABB_CCDD);

        let ret = check("c20800", 3, F::IMM16);
        assert_eq!(ret.imm.u16(), 8);

        check("f6c201", 3, F::MODRM | F::IMM8);
        check("f7c278563412", 6, F::MODRM | F::IMM32);

        // the test-immediate form is one-byte only
        let mask = decode(&hex("0ff7c1"));
        assert_eq!(mask.size, 3);
        assert!(mask.has_modrm());
        assert!(!mask.flags.intersects(F::IMM8 | F::IMM16 | F::IMM32));
    }

    #[test]
    fn test_enter_and_far_pointer() {
        let enter = check("c8100000", 4, F::IMM8 | F::IMM16);
        assert_eq!(enter.imm.u16(), 0x10);

        // nesting level lands in disp, frame size stays whole
        let nested = check("c8200102", 4, F::IMM8 | F::IMM16);
        assert_eq!(nested.imm.u16(), 0x0120);
        assert_eq!(nested.disp.u8(), 2);

        let far = check("ea112233445566", 7, F::IMM16 | F::IMM32);
        assert_eq!(far.imm.u32(), 0x4433_2211);
        assert_eq!(far.disp.u16(), 0x6655);
    }

    #[test]
    fn test_lock_prefix() {
        check("f00fb10a", 4, F::MODRM | F::PREFIX_LOCK);
        check("f001c0", 3, F::MODRM | F::PREFIX_LOCK | F::ERROR | F::ERROR_LOCK);
    }

    #[test]
    fn test_operand_prefixes() {
        check("660f6f00", 4, F::MODRM | F::PREFIX_66);
        let insn = check("f30f1005", 8, F::MODRM | F::DISP32 | F::PREFIX_REP);
        assert_eq!(insn.opcode2, Some(0x10));
        check("f390", 2, F::PREFIX_REP);
    }

    #[test]
    fn test_segment_override() {
        let insn = check("64a118000000", 6, F::IMM32 | F::PREFIX_SEG);
        assert_eq!(insn.segment(), Some(Segment::Fs));
    }

    #[test]
    fn test_operand_errors() {
        check("8c4810", 3, F::MODRM | F::DISP8);
        check("8ef8", 2, F::MODRM | F::ERROR | F::ERROR_OPERAND);
        check("8d00", 2, F::MODRM);
        check("8dc0", 2, F::MODRM | F::ERROR | F::ERROR_OPERAND);
        check("0f20e0", 3, F::MODRM);
    }

    #[test]
    fn test_fpu() {
        check("d9c0", 2, F::MODRM);
    }

    #[test]
    fn test_length_is_clamped() {
        let mut code = vec![0x66; 15];
        code.extend_from_slice(&[0x90, 0x90]);
        let insn = decode(&code);
        assert_eq!(insn.size, 15);
        assert!(insn.flags.contains(F::ERROR | F::ERROR_LENGTH));
        assert!(insn.is_error());
    }

    #[test]
    fn test_short_buffer_reads_as_zero_padded() {
        assert_eq!(decode(&hex("e812")).size, 5);
        assert_eq!(decode(&[]).size, 2);
        assert_eq!(decode_at(&hex("90e8"), 1).size, 5);
    }

    #[test]
    fn test_iterator_walks_function() {
        let code = hex("558bec83ec08e800000000c9c3");
        let sizes: Vec<_> = InstructionIter::new(&code, Address::new(0x401000))
            .map(|(addr, insn)| (addr.as_u32(), insn.size))
            .collect();
        assert_eq!(
            sizes,
            vec![(0x401000, 1), (0x401001, 2), (0x401003, 3), (0x401006, 5), (0x40100B, 1), (0x40100C, 1)]
        );
    }
}
