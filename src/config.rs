//! Construction-time configuration shared by both TLB variants.

use clap::ValueEnum;

/// Selects how per-way set indices are derived.
///
/// `Skewed` is the security-hardened mode described throughout this
/// crate. `PlainAssociative` is the `SATLB` baseline: every way reads
/// `(vpn >> log_bytes) % sets`, collapsing the skew into an ordinary
/// set-associative table with identical indices across ways. The
/// original codebase selects between these with a build-time `#ifdef`;
/// here it is an ordinary runtime field so a single binary can run
/// either configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "verbatim")]
pub enum IndexMode {
    Skewed,
    PlainAssociative,
}

/// Cache geometry, common to both variants.
#[derive(Clone, Copy, Debug)]
pub struct Geometry {
    pub sets: usize,
    pub ways: usize,
}

impl Geometry {
    pub const fn new(sets: usize, ways: usize) -> Self {
        Geometry { sets, ways }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::new(crate::constants::DEFAULT_SETS, crate::constants::DEFAULT_WAYS)
    }
}
