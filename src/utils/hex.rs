// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("Odd number of hex digits in '{0}'")]
    OddLength(String),
    #[error("Invalid hex digit in '{0}'")]
    InvalidDigit(String),
}

/// Parses `"55 8B EC"`, `"558bec"` or `"\x55\x8b\xec"` into bytes.
pub fn parse_bytes(text: &str) -> Result<Vec<u8>, HexError> {
    let digits: String = text
        .replace("\\x", "")
        .replace("0x", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength(text.to_string()));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| HexError::InvalidDigit(text.to_string()))
        })
        .collect()
}

pub fn format_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// Parses `0x401000` or `401000` (always hex).
pub fn parse_address(text: &str) -> Result<Address, HexError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16)
        .map(Address::new)
        .map_err(|_| HexError::InvalidDigit(text.to_string()))
}
