use clap::{Parser, Subcommand};

use crate::config::IndexMode;
use crate::constants::{DEFAULT_PRINCE_KEY, DEFAULT_SETS, DEFAULT_WAYS};

static NUM_PARSER_ERR: &str = "Invalid number. Must be base-10, or start with 0x or 0b.";

fn num_parser(s: &str) -> Result<u64, &'static str> {
    match s.get(0..2) {
        Some("0x") => u64::from_str_radix(&s[2..], 16).map_err(|_| NUM_PARSER_ERR),
        Some("0b") => u64::from_str_radix(&s[2..], 2).map_err(|_| NUM_PARSER_ERR),
        _ => s.parse::<u64>().map_err(|_| NUM_PARSER_ERR),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, value_enum, default_value = "Skewed")]
    pub mode: IndexMode,

    #[arg(long, default_value_t = DEFAULT_SETS)]
    pub sets: usize,

    #[arg(long, default_value_t = DEFAULT_WAYS)]
    pub ways: usize,

    #[arg(long, value_parser = num_parser, default_value_t = DEFAULT_PRINCE_KEY)]
    pub prince_key: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs a synthetic access trace against the per-ASID, tree-pLRU variant.
    Asid(TraceArgs),
    /// Runs a synthetic access trace against the non-ASID, plain-LRU variant.
    Global(TraceArgs),
}

#[derive(Parser, Debug, Clone, Copy)]
pub struct TraceArgs {
    #[arg(long, default_value_t = 10_000)]
    pub length: usize,
    #[arg(long, default_value_t = 256)]
    pub distinct_pages: u64,
    #[arg(long, default_value_t = 8)]
    pub asids: u16,
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
}
