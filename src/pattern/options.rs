// Tue Jan 13 2026 - Alex

use crate::config::ScanConfig;
use crate::memory::{Address, MemoryRange, Protection};
use crate::memory::snapshot::DEFAULT_ADDRESS_LIMIT;
use crate::pattern::{Pattern, PatternError};

/// What to look for and where.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub pattern: Pattern,
    pub range: MemoryRange,
    pub alignment: usize,
    pub limit: Option<usize>,
    /// Every flag here must be present on a region.
    pub required: Protection,
    /// No flag here may be present on a region.
    pub forbidden: Protection,
}

impl ScanOptions {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            range: MemoryRange::new(Address::zero(), DEFAULT_ADDRESS_LIMIT),
            alignment: 1,
            limit: None,
            required: Protection::empty(),
            forbidden: Protection::empty(),
        }
    }

    pub fn from_config(pattern: Pattern, config: &ScanConfig) -> Self {
        let mut options = Self::new(pattern)
            .with_range(MemoryRange::new(Address::zero(), config.range_max))
            .with_alignment(config.alignment);
        options.limit = config.limit;
        options
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_range(mut self, range: MemoryRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_protect(mut self, flags: Protection) -> Self {
        self.required |= flags;
        self.forbidden.remove(flags);
        self
    }

    pub fn without_protect(mut self, flags: Protection) -> Self {
        self.forbidden |= flags;
        self.required.remove(flags);
        self
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        if self.alignment == 0 {
            return Err(PatternError::InvalidAlignment(self.alignment));
        }
        if self.pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(())
    }

    pub fn allows(&self, protection: Protection) -> bool {
        protection.contains(self.required) && !protection.intersects(self.forbidden)
    }
}
