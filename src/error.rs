//! Construction-time configuration errors.
//!
//! Invariant violations discovered in the middle of a lookup/demap (a
//! valid slot whose page size is neither 4 KiB nor 2 MiB, or a tPLRU set
//! caught in an invalid permutation) are not represented here: they are
//! fatal and propagate as a panic carrying the offending `(set, way,
//! log_bytes)`, per the error-handling design.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `ways == 0`.
    NoWays,
    /// `sets == 0`.
    NoSets,
    /// More ways than a nibble can address (`ways > 16`).
    TooManyWays { ways: usize },
    /// The per-ASID variant packs one set index per nibble of a 64-bit
    /// PRF output, so `sets` must not exceed 16.
    TooManySetsForAsidVariant { sets: usize },
    /// The per-ASID variant's replacement policy (tree-pLRU) is only
    /// defined over a four-way permutation.
    AsidVariantRequiresFourWays { ways: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::NoWays => write!(f, "cache must have at least one way"),
            ConfigError::NoSets => write!(f, "cache must have at least one set"),
            ConfigError::TooManyWays { ways } => {
                write!(f, "ways ({ways}) exceeds the 16 addressable by one PRF nibble")
            }
            ConfigError::TooManySetsForAsidVariant { sets } => write!(
                f,
                "sets ({sets}) exceeds 16, the maximum the per-ASID variant's \
                 one-nibble-per-way set extraction can address"
            ),
            ConfigError::AsidVariantRequiresFourWays { ways } => write!(
                f,
                "per-ASID variant requires exactly 4 ways for tree-pLRU, got {ways}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
