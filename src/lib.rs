#[macro_use]
extern crate log;

mod cipher;
mod cli;
pub mod config;
mod constants;
mod entry;
mod error;
mod replacement;
mod stats;
mod table;
mod tlb;
mod trace;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use crate::cli::*;
pub use crate::config::{Geometry, IndexMode};
pub use crate::constants::{
    DEFAULT_PRINCE_KEY, DEFAULT_SETS, DEFAULT_WAYS, LOG_BYTES_HUGE_PAGE, LOG_BYTES_SMALL_PAGE,
    MAX_EVICT,
};
pub use crate::entry::TranslationEntry;
pub use crate::error::ConfigError;
pub use crate::stats::Stats;
pub use crate::tlb::{AsidTlb, GlobalTlb};
pub use crate::trace::{AccessTrace, Operation};

/// Builds an [`AccessTrace`] from parsed [`TraceArgs`].
pub fn generate_trace(args: &TraceArgs) -> AccessTrace {
    trace::generate(args.seed, args.length, args.distinct_pages, args.asids)
}
