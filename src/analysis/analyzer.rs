// Tue Jan 13 2026 - Alex

use crate::analysis::AnalysisError;
use crate::config::AnalysisConfig;
use crate::disasm::{self, Instruction, MAX_INSTRUCTION_LEN};
use crate::image::ImageLayout;
use crate::memory::{Address, MemoryRange, Module, TargetMemory};
use crate::pattern::{Pattern, PatternScanner, ScanOptions};
use serde::Serialize;
use std::sync::Arc;

const ADDRESS_SPACE: i64 = 1 << 32;

const PUSH_EBP: u8 = 0x55;
const PUSH_EBX: u8 = 0x53;
const PUSH_ESI: u8 = 0x56;
const MOV_R32_RM32: u8 = 0x8B;
const POP_EBP: u8 = 0x5D;
const LEAVE: u8 = 0xC9;
const RET: u8 = 0xC3;
const RET_IMM16: u8 = 0xC2;
const CALL_REL32: u8 = 0xE8;
const JMP_REL32: u8 = 0xE9;

/// Start and end of a function, as found by the frame heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunctionBounds {
    pub start: Address,
    /// Address of the `ret` that closes the frame.
    pub end: Address,
}

/// Byte-level heuristics over a target's code.
///
/// Frames are recognised by fixed byte sequences (`push reg; mov reg, esp`
/// and `pop ebp/leave; ret`), and functions are assumed to start on a
/// `function_alignment` boundary.
pub struct CodeAnalyzer {
    target: Arc<dyn TargetMemory>,
    scanner: PatternScanner,
    config: AnalysisConfig,
}

impl CodeAnalyzer {
    pub fn new(target: Arc<dyn TargetMemory>) -> Self {
        Self {
            target,
            scanner: PatternScanner::new(),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn target(&self) -> &dyn TargetMemory {
        self.target.as_ref()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// `push ebp; mov ebp, esp` and the ebx/esi variants.
    pub fn prologue_at(&self, addr: Address) -> Result<bool, AnalysisError> {
        let bytes = self.target.read_bytes(addr, 3)?;
        if bytes[1] != MOV_R32_RM32 {
            return Ok(false);
        }
        Ok(matches!(
            (bytes[0], bytes[2]),
            (PUSH_EBP, 0xEC) | (PUSH_EBX, 0xDC) | (PUSH_ESI, 0xF4)
        ))
    }

    /// `pop ebp` or `leave` followed by the `ret` at `addr`. A `ret imm16`
    /// only counts when the immediate is a multiple of 4.
    pub fn epilogue_at(&self, addr: Address) -> Result<bool, AnalysisError> {
        let bytes = self.target.read_bytes(addr - 1, 3)?;
        if bytes[0] != POP_EBP && bytes[0] != LEAVE {
            return Ok(false);
        }

        match bytes[1] {
            RET => Ok(true),
            RET_IMM16 => Ok(self.target.read_u16(addr + 1)? % 4 == 0),
            _ => Ok(false),
        }
    }

    pub fn get_prologue(&self, addr: Address) -> Result<Address, AnalysisError> {
        if self.prologue_at(addr)? {
            return Ok(addr);
        }
        self.last_prologue(addr)
    }

    pub fn get_epilogue(&self, addr: Address) -> Result<Address, AnalysisError> {
        if self.epilogue_at(addr)? {
            return Ok(addr);
        }
        self.next_epilogue(addr)
    }

    pub fn next_prologue(&self, addr: Address) -> Result<Address, AnalysisError> {
        self.find_prologue(addr, true)
    }

    pub fn last_prologue(&self, addr: Address) -> Result<Address, AnalysisError> {
        self.find_prologue(addr, false)
    }

    pub fn next_epilogue(&self, addr: Address) -> Result<Address, AnalysisError> {
        self.find_epilogue(addr, true)
    }

    pub fn last_epilogue(&self, addr: Address) -> Result<Address, AnalysisError> {
        self.find_epilogue(addr, false)
    }

    pub fn function_at(&self, addr: Address) -> Result<FunctionBounds, AnalysisError> {
        let start = self.get_prologue(addr)?;
        let end = self.get_epilogue(addr.max(start))?;
        Ok(FunctionBounds { start, end })
    }

    /// First address at or after `addr` satisfying `predicate`.
    pub fn next_matching<F>(&self, addr: Address, predicate: F) -> Result<Address, AnalysisError>
    where
        F: FnMut(Address) -> Result<bool, AnalysisError>,
    {
        self.search(addr, addr.as_u64() as i64, 1, predicate)
    }

    /// First address at or before `addr` satisfying `predicate`.
    pub fn last_matching<F>(&self, addr: Address, predicate: F) -> Result<Address, AnalysisError>
    where
        F: FnMut(Address) -> Result<bool, AnalysisError>,
    {
        self.search(addr, addr.as_u64() as i64, -1, predicate)
    }

    fn find_prologue(&self, addr: Address, forward: bool) -> Result<Address, AnalysisError> {
        let alignment = self.config.function_alignment.max(1) as i64;
        let step = if forward { alignment } else { -alignment };

        let mut from = addr.as_u64() as i64;
        if self.prologue_at(addr)? {
            from += step;
        }
        from = if forward {
            (from + alignment - 1).div_euclid(alignment) * alignment
        } else {
            from.div_euclid(alignment) * alignment
        };

        self.search(addr, from, step, |at| self.prologue_at(at))
    }

    fn find_epilogue(&self, addr: Address, forward: bool) -> Result<Address, AnalysisError> {
        let step = if forward { 1 } else { -1 };
        let mut from = addr.as_u64() as i64;
        if self.epilogue_at(addr)? {
            from += step;
        }
        self.search(addr, from, step, |at| self.epilogue_at(at))
    }

    fn search<F>(&self, origin: Address, from: i64, step: i64, mut predicate: F) -> Result<Address, AnalysisError>
    where
        F: FnMut(Address) -> Result<bool, AnalysisError>,
    {
        let limit = self.config.max_search_distance;
        let origin_pos = origin.as_u64() as i64;
        let mut pos = from;

        while (0..ADDRESS_SPACE).contains(&pos) && (pos - origin_pos).abs() <= limit as i64 {
            let at = Address::new(pos as u32);
            if predicate(at)? {
                return Ok(at);
            }
            pos += step;
        }

        log::debug!("search from {} gave up at 0x{:X}", origin, pos);
        Err(AnalysisError::SearchExhausted { start: origin, limit })
    }

    /// Target of the rel32 operand following the opcode byte at `addr`.
    pub fn get_rel32(&self, addr: Address) -> Result<Address, AnalysisError> {
        let rel = self.target.read_i32(addr + 1)?;
        Ok((addr + 5).offset(rel))
    }

    pub fn is_rel32_call(&self, addr: Address) -> Result<bool, AnalysisError> {
        self.is_direct_branch(addr, CALL_REL32)
    }

    pub fn is_rel32_jmp(&self, addr: Address) -> Result<bool, AnalysisError> {
        self.is_direct_branch(addr, JMP_REL32)
    }

    /// The target must sit on the function grid inside the module that
    /// holds the branch; addresses outside any module never qualify.
    fn is_direct_branch(&self, addr: Address, opcode: u8) -> Result<bool, AnalysisError> {
        if self.target.read_u8(addr)? != opcode {
            return Ok(false);
        }

        let dest = self.get_rel32(addr)?;
        if !dest.is_aligned(self.config.function_alignment) {
            return Ok(false);
        }

        let modules = self.target.modules()?;
        let source = modules.iter().find(|m| m.contains(addr));
        let target = modules.iter().find(|m| m.contains(dest));
        Ok(source.is_some() && source == target)
    }

    /// Call sites (`call rel32`) in the owning module that land on `addr`.
    pub fn call_xrefs(&self, addr: Address) -> Result<Vec<Address>, AnalysisError> {
        let module = self
            .target
            .module_at(addr)?
            .ok_or(AnalysisError::ModuleNotFound(addr))?;

        let pattern = Pattern::from_simple(&[CALL_REL32, 0, 0, 0, 0], "x????")?.with_name("call rel32");
        let options = ScanOptions::new(pattern).with_range(MemoryRange::from_module(&module));
        // resolve from the matched bytes, no second read per call site
        let outcome = self.scanner.scan_filtered(self.target(), &options, |site, bytes| {
            let rel = i32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
            (site + 5).offset(rel) == addr
        })?;
        if !outcome.is_complete() {
            log::warn!("call scan of {} was incomplete: {:?}", module, outcome.completion);
        }

        log::debug!("{} calls to {}", outcome.len(), addr);
        Ok(outcome.matches)
    }

    /// Locates `string` in the module's constant (or data) section and
    /// returns every place in the module holding a pointer to it.
    pub fn string_xrefs(
        &self,
        string: &str,
        constant: bool,
        module: Option<&Module>,
    ) -> Result<Vec<Address>, AnalysisError> {
        let module = match module {
            Some(module) => module.clone(),
            None => self.target.main_module()?,
        };

        let location = self.find_string(string, constant, &module)?;
        log::debug!("'{}' lives at {}", string, location);

        let options = ScanOptions::new(Pattern::from_value(location)).with_range(MemoryRange::from_module(&module));
        let outcome = self.scanner.scan(self.target(), &options)?;
        if !outcome.is_complete() {
            log::warn!("xref scan of {} was incomplete: {:?}", module, outcome.completion);
        }
        Ok(outcome.matches)
    }

    /// First aligned occurrence of `string` in the module's string or data section.
    pub fn find_string(&self, string: &str, constant: bool, module: &Module) -> Result<Address, AnalysisError> {
        let section_name = if constant {
            &self.config.string_section
        } else {
            &self.config.data_section
        };

        let layout = ImageLayout::read(self.target(), module)?;
        let section = layout
            .section(section_name)
            .ok_or_else(|| AnalysisError::SectionNotFound(section_name.clone()))?;

        let pattern = Pattern::from_string(string, self.config.null_terminate_strings)?;
        let options = ScanOptions::new(pattern)
            .with_range(MemoryRange::from_section(module, section))
            .with_alignment(self.config.string_alignment)
            .with_limit(1);

        self.scanner
            .scan(self.target(), &options)?
            .first()
            .ok_or_else(|| AnalysisError::StringNotFound {
                string: string.to_string(),
                module: module.name().unwrap_or_else(|| module.base.to_string()),
            })
    }

    /// Decodes the instruction at `addr`, tolerating a short tail at the
    /// end of a mapping.
    pub fn instruction_at(&self, addr: Address) -> Result<Instruction, AnalysisError> {
        let mut last_error = None;
        for len in (1..=MAX_INSTRUCTION_LEN + 1).rev() {
            match self.target.read_bytes(addr, len) {
                Ok(bytes) => return Ok(disasm::decode(&bytes)),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.map(AnalysisError::from).unwrap_or(AnalysisError::ModuleNotFound(addr)))
    }

    pub fn static_address(&self, addr: Address) -> Result<Option<String>, AnalysisError> {
        Ok(self.target.static_address(addr)?)
    }
}
