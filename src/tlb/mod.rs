//! The two TLB façade variants. They share a slot [`crate::table::Table`]
//! and the [`crate::cipher`] PRF, but differ enough in epoch bookkeeping
//! and replacement discipline (tree-pLRU over a literal physical set vs.
//! plain LRU over a caller-maintained timestamp) that duplicating the
//! façade, the way the two ISA backends this is modeled on do, reads
//! clearer than forcing them through one generic shape.

mod asid;
mod global;

pub use asid::AsidTlb;
pub use global::GlobalTlb;
