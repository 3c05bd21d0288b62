// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use crate::pattern::PatternError;
use std::fmt;
use std::str::FromStr;

/// A byte signature with a per-byte mask.
///
/// `mask[i]` is true when byte `i` must match exactly; false marks a
/// wildcard that matches any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<bool>,
    name: Option<String>,
}

impl Pattern {
    pub fn new(bytes: Vec<u8>, mask: Vec<bool>) -> Result<Self, PatternError> {
        if bytes.len() != mask.len() {
            return Err(PatternError::LengthMismatch { bytes: bytes.len(), mask: mask.len() });
        }
        if bytes.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { bytes, mask, name: None })
    }

    /// Parses `"01 02 ?? 04"`. `?` and `??` are wildcards; partial
    /// wildcards such as `?3` are rejected.
    pub fn from_aob(text: &str) -> Result<Self, PatternError> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();

        for token in text.split_whitespace() {
            if token == "?" || token == "??" {
                bytes.push(0);
                mask.push(false);
                continue;
            }
            if token.len() != 2 {
                return Err(PatternError::InvalidToken(token.to_string()));
            }
            let byte = u8::from_str_radix(token, 16).map_err(|_| PatternError::InvalidToken(token.to_string()))?;
            bytes.push(byte);
            mask.push(true);
        }

        Self::new(bytes, mask)
    }

    /// Raw bytes with a code-style mask such as `"xx?x"`; only `?` is a wildcard.
    pub fn from_simple(bytes: &[u8], mask: &str) -> Result<Self, PatternError> {
        let mask: Vec<bool> = mask.chars().map(|c| c != '?').collect();
        Self::new(bytes.to_vec(), mask)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PatternError> {
        Self::new(bytes.to_vec(), vec![true; bytes.len()])
    }

    /// ASCII bytes of `text`, optionally followed by a NUL.
    pub fn from_string(text: &str, null_terminated: bool) -> Result<Self, PatternError> {
        let mut bytes = text.as_bytes().to_vec();
        if null_terminated {
            bytes.push(0);
        }
        Self::from_bytes(&bytes)
    }

    /// Exact pattern over the in-memory representation of a value.
    pub fn from_value<T: RawValue>(value: T) -> Self {
        let bytes = value.raw_bytes();
        let mask = vec![true; bytes.len()];
        Self { bytes, mask, name: None }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn wildcard_count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    /// Compares the pattern against the start of `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.bytes.len() {
            return false;
        }

        self.bytes
            .iter()
            .zip(self.mask.iter())
            .zip(data.iter())
            .all(|((pattern_byte, &significant), &data_byte)| !significant || *pattern_byte == data_byte)
    }

    pub fn find_in(&self, data: &[u8]) -> Option<usize> {
        self.find_all_in(data, 1).into_iter().next()
    }

    /// Offsets of every match in `data` whose offset is a multiple of `alignment`.
    pub fn find_all_in(&self, data: &[u8], alignment: usize) -> Vec<usize> {
        let alignment = alignment.max(1);
        if self.bytes.is_empty() || data.len() < self.bytes.len() {
            return Vec::new();
        }

        (0..=data.len() - self.bytes.len())
            .step_by(alignment)
            .filter(|&i| self.matches(&data[i..]))
            .collect()
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_aob(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .bytes
            .iter()
            .zip(self.mask.iter())
            .map(|(byte, &significant)| if significant { format!("{:02X}", byte) } else { "??".to_string() })
            .collect();
        write!(f, "{}", tokens.join(" "))
    }
}

/// Values that can be searched for by their raw little-endian bytes.
pub trait RawValue {
    fn raw_bytes(&self) -> Vec<u8>;
}

macro_rules! impl_raw_value {
    ($($ty:ty),*) => {
        $(impl RawValue for $ty {
            fn raw_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }
        })*
    };
}

impl_raw_value!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl RawValue for Address {
    fn raw_bytes(&self) -> Vec<u8> {
        self.as_u32().to_le_bytes().to_vec()
    }
}
