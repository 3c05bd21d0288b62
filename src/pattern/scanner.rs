// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryRange, TargetMemory};
use crate::pattern::{Pattern, PatternError, RawValue, ScanOptions};
use rayon::prelude::*;
use serde::Serialize;

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanCompletion {
    /// The whole range was walked.
    Exhausted,
    /// The result limit was hit.
    LimitReached,
    /// A region query failed at `at`; memory past it was not examined.
    Truncated { at: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub matches: Vec<Address>,
    pub completion: ScanCompletion,
    /// Accessible regions that could not be read and were skipped.
    pub unreadable_regions: usize,
}

impl ScanOutcome {
    fn new() -> Self {
        Self {
            matches: Vec::new(),
            completion: ScanCompletion::Exhausted,
            unreadable_regions: 0,
        }
    }

    pub fn first(&self) -> Option<Address> {
        self.matches.first().copied()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// True when an empty result really means "not present".
    pub fn is_complete(&self) -> bool {
        !matches!(self.completion, ScanCompletion::Truncated { .. }) && self.unreadable_regions == 0
    }
}

/// Walks a target's regions looking for a pattern.
///
/// Only committed, readable regions are examined; no-access, guard and
/// no-cache pages are skipped. Each scan owns its read buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternScanner;

impl PatternScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, target: &dyn TargetMemory, options: &ScanOptions) -> Result<ScanOutcome, PatternError> {
        self.scan_filtered(target, options, |_, _| true)
    }

    /// Like [`scan`](Self::scan), but a match is only kept when `keep`
    /// accepts its address and matched bytes. Rejected matches do not
    /// count towards the limit.
    pub fn scan_filtered<F>(
        &self,
        target: &dyn TargetMemory,
        options: &ScanOptions,
        mut keep: F,
    ) -> Result<ScanOutcome, PatternError>
    where
        F: FnMut(Address, &[u8]) -> bool,
    {
        options.validate()?;

        let mut outcome = ScanOutcome::new();
        if options.limit == Some(0) {
            outcome.completion = ScanCompletion::LimitReached;
            return Ok(outcome);
        }

        let pattern = &options.pattern;
        let alignment = options.alignment;
        let max = options.range.end();
        let mut buffer: Vec<u8> = Vec::new();
        let mut at = options.range.start().as_u64();

        while at < max {
            let addr = Address::new(at as u32);
            let region = match target.query_region(addr) {
                Ok(region) => region,
                Err(e) => {
                    log::warn!("scan for {} stopped at {}: {}", pattern, addr, e);
                    outcome.completion = ScanCompletion::Truncated { at: addr };
                    return Ok(outcome);
                }
            };

            let next = region.end();
            if next <= at {
                log::warn!("region query at {} made no progress", addr);
                outcome.completion = ScanCompletion::Truncated { at: addr };
                return Ok(outcome);
            }

            if !region.is_accessible() || !options.allows(region.protection()) {
                log::debug!("skipping {}", region);
                at = next;
                continue;
            }

            let start = at.max(region.base().as_u64());
            let clipped = (next.min(max) - start) as usize;
            // candidates sit on absolute multiples of the alignment
            let first = (alignment - (start as usize) % alignment) % alignment;
            if clipped <= first {
                at = next;
                continue;
            }
            let len = first + (clipped - first) / alignment * alignment;
            if len < first + pattern.len() {
                at = next;
                continue;
            }

            if buffer.len() < len {
                buffer.resize(len, 0);
            }

            let start_addr = Address::new(start as u32);
            let read = match target.read_into(start_addr, &mut buffer[..len]) {
                Ok(read) => read,
                Err(e) => {
                    log::debug!("unreadable region {}: {}", region, e);
                    outcome.unreadable_regions += 1;
                    at = next;
                    continue;
                }
            };
            log::debug!("scanning 0x{:X} bytes at {}", read, start_addr);

            let mut i = first;
            while i + pattern.len() <= read {
                let window = &buffer[i..i + pattern.len()];
                let found = start_addr + i as u32;
                if pattern.matches(window) && keep(found, window) {
                    outcome.matches.push(found);
                    if Some(outcome.matches.len()) == options.limit {
                        outcome.completion = ScanCompletion::LimitReached;
                        return Ok(outcome);
                    }
                }
                i += alignment;
            }

            at = next;
        }

        Ok(outcome)
    }

    /// Runs independent scans in parallel against the same target.
    pub fn scan_many(
        &self,
        target: &dyn TargetMemory,
        options: &[ScanOptions],
    ) -> Vec<Result<ScanOutcome, PatternError>> {
        options.par_iter().map(|opts| self.scan(target, opts)).collect()
    }

    /// Looks for the raw bytes of `value`, using the rest of `options`.
    pub fn find_value<T: RawValue>(
        &self,
        target: &dyn TargetMemory,
        value: T,
        options: &ScanOptions,
    ) -> Result<ScanOutcome, PatternError> {
        let options = options.clone().with_pattern(Pattern::from_value(value));
        self.scan(target, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryError, MemoryRegion, Protection, SnapshotMemory};

    fn target() -> SnapshotMemory {
        let mut code = vec![0u8; 0x2000];
        code[0x123..0x128].copy_from_slice(&[0xE8, 0x11, 0x22, 0x33, 0x44]);
        code[0x1FFE] = 0x55;
        code[0x1FFF] = 0x8B;

        let mut data = vec![0u8; 0x1000];
        data[0x10..0x14].copy_from_slice(&0x0040_1123u32.to_le_bytes());

        let mut guarded = vec![0u8; 0x1000];
        guarded[0..5].copy_from_slice(&[0xE8, 0x11, 0x22, 0x33, 0x44]);

        SnapshotMemory::new()
            .map(Address::new(0x401000), code, Protection::EXECUTE_READ)
            .map(Address::new(0x403000), data, Protection::READWRITE)
            .map(Address::new(0x405000), guarded, Protection::READWRITE | Protection::GUARD)
    }

    fn options(aob: &str) -> ScanOptions {
        ScanOptions::new(Pattern::from_aob(aob).unwrap())
    }

    #[test]
    fn test_finds_single_match() {
        let outcome = PatternScanner::new().scan(&target(), &options("E8 11 22 33 44")).unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x401123)]);
        assert_eq!(outcome.completion, ScanCompletion::Exhausted);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_wildcards_and_alignment() {
        let scanner = PatternScanner::new();
        let range = MemoryRange::from_start_size(Address::new(0x403000), 0x20);
        let all = scanner.scan(&target(), &options("??").with_range(range)).unwrap();
        assert_eq!(all.len(), 0x20);

        let aligned = scanner.scan(&target(), &options("??").with_range(range).with_alignment(4)).unwrap();
        assert_eq!(aligned.len(), 8);
        assert!(aligned.matches.iter().all(|a| a.is_aligned(4)));

        let call = options("E8 ?? ?? ?? ??");
        assert!(scanner.scan(&target(), &call.clone().with_alignment(16)).unwrap().is_empty());
        assert_eq!(scanner.scan(&target(), &call).unwrap().len(), 1);
    }

    #[test]
    fn test_match_at_region_end() {
        let outcome = PatternScanner::new().scan(&target(), &options("55 8B")).unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x402FFE)]);

        // no match across the boundary into the next mapping
        let across = PatternScanner::new().scan(&target(), &options("8B 00")).unwrap();
        assert!(across.is_empty());
    }

    #[test]
    fn test_unaligned_range_start_keeps_tail_match() {
        let mem = SnapshotMemory::new().map(
            Address::new(0x10000),
            {
                let mut data = vec![0u8; 0x1000];
                data[0xFFC..].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
                data
            },
            Protection::READWRITE,
        );
        let scanner = PatternScanner::new();
        for start in [0x10000, 0x10001, 0x10003] {
            let opts = options("DE AD BE EF")
                .with_range(MemoryRange::new(Address::new(start), 0x11000))
                .with_alignment(4);
            let outcome = scanner.scan(&mem, &opts).unwrap();
            assert_eq!(outcome.matches, vec![Address::new(0x10FFC)], "start 0x{:X}", start);
            assert_eq!(outcome.completion, ScanCompletion::Exhausted);
        }
    }

    #[test]
    fn test_scan_filtered() {
        let scanner = PatternScanner::new();
        let opts = options("00 00").with_range(MemoryRange::from_start_size(Address::new(0x403000), 0x20));
        let mut seen = Vec::new();
        let outcome = scanner
            .scan_filtered(&target(), &opts.with_limit(2), |addr, bytes| {
                seen.push(bytes.to_vec());
                addr.as_u32() >= 0x403014
            })
            .unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x403014), Address::new(0x403015)]);
        assert_eq!(outcome.completion, ScanCompletion::LimitReached);
        assert!(seen.iter().all(|b| b == &[0, 0]));
    }

    #[test]
    fn test_range_clips_regions() {
        let opts = options("55 8B").with_range(MemoryRange::new(Address::new(0x401000), 0x402FFF));
        assert!(PatternScanner::new().scan(&target(), &opts).unwrap().is_empty());
    }

    #[test]
    fn test_limit() {
        let opts = options("00").with_limit(3);
        let outcome = PatternScanner::new().scan(&target(), &opts).unwrap();
        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.completion, ScanCompletion::LimitReached);
        assert_eq!(outcome.first(), Some(Address::new(0x401000)));
    }

    #[test]
    fn test_protection_filter() {
        let opts = options("23 11 40 00").with_protect(Protection::EXECUTE_READ);
        assert!(PatternScanner::new().scan(&target(), &opts).unwrap().is_empty());

        let opts = options("23 11 40 00").without_protect(Protection::EXECUTE_READ);
        let outcome = PatternScanner::new().scan(&target(), &opts).unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x403010)]);
    }

    #[test]
    fn test_find_value() {
        let scanner = PatternScanner::new();
        let outcome = scanner.find_value(&target(), 0x0040_1123u32, &options("00")).unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x403010)]);
    }

    #[test]
    fn test_truncated_when_query_fails() {
        let mem = target().with_address_limit(0x404000);
        let opts = options("E8 11 22 33 44").with_range(MemoryRange::new(Address::new(0x400000), 0x406000));
        let outcome = PatternScanner::new().scan(&mem, &opts).unwrap();
        assert_eq!(outcome.matches, vec![Address::new(0x401123)]);
        assert_eq!(outcome.completion, ScanCompletion::Truncated { at: Address::new(0x404000) });
        assert!(!outcome.is_complete());
    }

    struct Unreadable(SnapshotMemory);

    impl TargetMemory for Unreadable {
        fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
            Err(MemoryError::ReadFailed { address: addr, len })
        }

        fn query_region(&self, addr: Address) -> Result<MemoryRegion, MemoryError> {
            self.0.query_region(addr)
        }

        fn modules(&self) -> Result<Vec<crate::memory::Module>, MemoryError> {
            self.0.modules()
        }
    }

    #[test]
    fn test_unreadable_regions_are_counted() {
        let outcome = PatternScanner::new().scan(&Unreadable(target()), &options("E8")).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.unreadable_regions, 2);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_scan_many() {
        let results = PatternScanner::new().scan_many(&target(), &[options("E8 11"), options("55 8B"), options("90")]);
        let counts: Vec<_> = results.into_iter().map(|r| r.unwrap().len()).collect();
        assert_eq!(counts, vec![1, 1, 0]);
    }

    #[test]
    fn test_rejects_zero_alignment() {
        let err = PatternScanner::new().scan(&target(), &options("90").with_alignment(0));
        assert_eq!(err, Err(PatternError::InvalidAlignment(0)));
    }
}
