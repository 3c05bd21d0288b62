// Thu Jan 15 2026 - Alex

//! Length decoder for 32-bit x86 code.

pub mod decoder;
pub mod flags;
pub mod instruction;
pub mod table;
pub mod value;

pub use decoder::{decode, decode_at, InstructionIter, MAX_INSTRUCTION_LEN};
pub use flags::{InstructionFlags, Segment};
pub use instruction::Instruction;
pub use value::Value;
