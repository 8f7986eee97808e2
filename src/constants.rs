//! Page-size and default geometry constants shared by both TLB variants.

/// Page-size exponent for a 4 KiB page (`log2(4096)`).
pub const LOG_BYTES_SMALL_PAGE: u8 = 12;
/// Page-size exponent for a 2 MiB page (`log2(2 * 1024 * 1024)`).
pub const LOG_BYTES_HUGE_PAGE: u8 = 21;

/// Default number of physical sets.
pub const DEFAULT_SETS: usize = 16;
/// Default number of ways.
pub const DEFAULT_WAYS: usize = 4;

/// Ways an ASID-indexed tree-pLRU cache must have: the tPLRU encoding is
/// only defined for a four-way permutation of {1,2,3,4}.
pub const ASID_VARIANT_WAYS: usize = 4;

/// Consecutive full-set evictions for one epoch before re-randomization.
pub const MAX_EVICT: u32 = 64;

/// Fixed per-run PRINCE key. Not a secret; see [`crate::cipher`].
pub const DEFAULT_PRINCE_KEY: u64 = 0x0011_2233_4455_6677;

pub(crate) fn is_supported_page_size(log_bytes: u8) -> bool {
    log_bytes == LOG_BYTES_SMALL_PAGE || log_bytes == LOG_BYTES_HUGE_PAGE
}
