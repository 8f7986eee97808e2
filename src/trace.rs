//! Deterministic synthetic access trace generation, for exercising a
//! TLB variant without wiring up a real page-table walker. Seeded with
//! a plain splitmix64 step rather than pulling in a `rand` crate — the
//! generator only needs to be reproducible, not cryptographically
//! sound.

use crate::constants::{LOG_BYTES_HUGE_PAGE, LOG_BYTES_SMALL_PAGE};
use crate::entry::TranslationEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup { vaddr: u64, asid: u16 },
    Insert { entry: TranslationEntry },
    DemapPage { vaddr: u64, asid: u16 },
    DemapPageComplex { vaddr: u64, asid: u32 },
    FlushAll,
    /// Non-ASID-variant-only; a no-op against [`crate::AsidTlb`].
    FlushNonGlobal,
}

pub struct AccessTrace {
    ops: Vec<Operation>,
}

impl AccessTrace {
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Generates `len` operations over a working set of `distinct_pages`
/// hot virtual pages under `asids` distinct address spaces, occasional
/// huge pages, demaps, and periodic `FlushAll`s, all reproducible from
/// `seed`.
pub fn generate(seed: u64, len: usize, distinct_pages: u64, asids: u16) -> AccessTrace {
    let mut rng = SplitMix64(seed ^ 0xD1B5_4A32_D192_ED03);
    let asids = asids.max(1);
    let mut ops = Vec::with_capacity(len);

    for i in 0..len {
        let asid = rng.below(asids as u64) as u16;
        let page = rng.below(distinct_pages);
        let huge = rng.below(8) == 0;
        let log_bytes = if huge { LOG_BYTES_HUGE_PAGE } else { LOG_BYTES_SMALL_PAGE };
        let vaddr = page << log_bytes;

        let op = match rng.below(10) {
            0 => Operation::DemapPage { vaddr, asid },
            1 if i % 97 == 0 => Operation::FlushAll,
            2 if i % 53 == 0 => Operation::FlushNonGlobal,
            2 => Operation::DemapPageComplex { vaddr, asid: asid as u32 },
            3..=4 => {
                let global = rng.below(16) == 0;
                Operation::Insert { entry: TranslationEntry::new(vaddr, asid, log_bytes, global) }
            }
            _ => Operation::Lookup { vaddr, asid },
        };
        ops.push(op);
    }

    AccessTrace { ops }
}
