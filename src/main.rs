#[macro_use]
extern crate log;

use anyhow::Result;
use clap::Parser;

use skew_tlb::{
    AccessTrace, Args, AsidTlb, Commands, GlobalTlb, Geometry, Operation, Stats, TraceArgs,
};

pub fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!(
        "skew_tlb {} ({})",
        skew_tlb::built_info::PKG_VERSION,
        skew_tlb::built_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown")
    );

    let geometry = Geometry::new(args.sets, args.ways);

    match args.command {
        Commands::Asid(trace_args) => {
            let mut tlb = AsidTlb::new(geometry, args.mode, args.prince_key)?;
            let trace = skew_tlb::generate_trace(&trace_args);
            let stats = run_asid(&mut tlb, &trace);
            info!("{stats}");
            info!("rerandomizations={}", tlb.rerand_request_count());
        }
        Commands::Global(trace_args) => {
            let mut tlb = GlobalTlb::new(geometry, args.mode, args.prince_key)?;
            let trace = skew_tlb::generate_trace(&trace_args);
            let stats = run_global(&mut tlb, &trace);
            info!("{stats}");
            info!(
                "rerandomizations={} global_page_max={}",
                tlb.rerand_request_count(),
                tlb.global_page_max()
            );
        }
    }

    Ok(())
}

fn run_asid(tlb: &mut AsidTlb, trace: &AccessTrace) -> Stats {
    let mut stats = Stats::default();
    for op in trace.ops() {
        match *op {
            Operation::Lookup { vaddr, asid } => {
                stats.record_lookup(tlb.lookup(vaddr, asid).is_some());
            }
            Operation::Insert { entry } => {
                tlb.insert(entry);
                stats.record_insert(false);
            }
            Operation::DemapPage { vaddr, asid } => {
                tlb.demap_page(vaddr, asid);
                stats.record_demap();
            }
            Operation::DemapPageComplex { vaddr, asid } => {
                tlb.demap_page_complex(vaddr, asid);
                stats.record_demap();
            }
            Operation::FlushAll => {
                tlb.flush_all();
                stats.record_flush();
            }
            Operation::FlushNonGlobal => {
                // Architectural operation of the non-ASID variant only.
            }
        }
    }
    stats
}

fn run_global(tlb: &mut GlobalTlb, trace: &AccessTrace) -> Stats {
    let mut stats = Stats::default();
    for op in trace.ops() {
        match *op {
            Operation::Lookup { vaddr, asid } => {
                stats.record_lookup(tlb.lookup(vaddr, asid).is_some());
            }
            Operation::Insert { entry } => {
                tlb.insert(entry);
                stats.record_insert(false);
            }
            Operation::DemapPage { vaddr, asid } => {
                tlb.demap_page(vaddr, asid);
                stats.record_demap();
            }
            Operation::DemapPageComplex { vaddr, asid } => {
                tlb.demap_page_complex(vaddr, asid);
                stats.record_demap();
            }
            Operation::FlushAll => {
                tlb.flush_all();
                stats.record_flush();
            }
            Operation::FlushNonGlobal => {
                tlb.flush_non_global();
                stats.record_flush();
            }
        }
    }
    stats
}
