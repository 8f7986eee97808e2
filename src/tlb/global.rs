//! Non-ASID, skewed (or plain), caller-timestamped LRU TLB variant.
//!
//! Unlike [`super::AsidTlb`], there is no per-ASID epoch bookkeeping:
//! one `random_id` counter covers the whole table, and replacement is
//! a single monotonically increasing `lru_seq` the caller stamps on
//! every access — this module never mints its own timestamps, and
//! never promotes on lookup.

use log::{debug, trace, warn};

use crate::cipher;
use crate::config::{Geometry, IndexMode};
use crate::constants::{
    is_supported_page_size, LOG_BYTES_HUGE_PAGE, LOG_BYTES_SMALL_PAGE, MAX_EVICT,
};
use crate::entry::{page_base, TranslationEntry};
use crate::error::ConfigError;
use crate::replacement::plain_lru;
use crate::table::Table;

pub struct GlobalTlb {
    table: Table,
    mode: IndexMode,
    prince_key: u64,
    random_id: u64,
    evict_cnt: u32,
    rerand_requests: u64,
    global_page_max: u64,
}

impl GlobalTlb {
    pub fn new(geometry: Geometry, mode: IndexMode, prince_key: u64) -> Result<Self, ConfigError> {
        if geometry.ways == 0 {
            return Err(ConfigError::NoWays);
        }
        if geometry.sets == 0 {
            return Err(ConfigError::NoSets);
        }
        if geometry.ways > 16 {
            return Err(ConfigError::TooManyWays { ways: geometry.ways });
        }
        let table = Table::new(geometry.sets, geometry.ways, |_way| 0);
        Ok(GlobalTlb {
            table,
            mode,
            prince_key,
            random_id: 0,
            evict_cnt: 0,
            rerand_requests: 0,
            global_page_max: 0,
        })
    }

    /// Running high-water mark of valid, global-flagged slots, updated
    /// each time [`Self::flush_non_global`] runs.
    pub fn global_page_max(&self) -> u64 {
        self.global_page_max
    }

    fn count_global_pages(&self) -> u64 {
        self.table
            .iter_positions()
            .filter(|&(set, way)| {
                let slot = self.table.slot(set, way);
                slot.valid && slot.entry.global
            })
            .count() as u64
    }

    pub fn random_id(&self) -> u64 {
        self.random_id
    }

    pub fn rerand_request_count(&self) -> u64 {
        self.rerand_requests
    }

    fn set_vector(&self, base: u64, log_bytes: u8) -> Vec<usize> {
        match self.mode {
            IndexMode::Skewed => cipher::global_set_vector(
                base,
                self.prince_key,
                self.random_id,
                self.table.sets,
                self.table.ways,
            ),
            IndexMode::PlainAssociative => {
                cipher::plain_set_vector(base, log_bytes, self.table.sets, self.table.ways)
            }
        }
    }

    fn check_invariant(&self, set: usize, way: usize, log_bytes: u8) {
        if !is_supported_page_size(log_bytes) {
            panic!(
                "TLB invariant violation: slot (set={set}, way={way}) holds unsupported \
                 log_bytes={log_bytes}"
            );
        }
    }

    /// Unlike [`super::AsidTlb`], a match here never compares `asid` —
    /// the non-ASID variant has no notion of an address-space-scoped
    /// entry; isolation across contexts is the caller's job via
    /// `flush_non_global` at a context switch, not a per-lookup filter.
    fn find(&self, va: u64) -> Option<(usize, usize)> {
        for &log_bytes in &[LOG_BYTES_SMALL_PAGE, LOG_BYTES_HUGE_PAGE] {
            let base = page_base(va, log_bytes);
            let set_vector = self.set_vector(base, log_bytes);
            for way in 0..self.table.ways {
                let set = set_vector[way];
                let slot = self.table.slot(set, way);
                if !slot.valid {
                    continue;
                }
                self.check_invariant(set, way, slot.entry.log_bytes);
                if slot.entry.log_bytes == log_bytes && slot.entry.vaddr == base {
                    return Some((set, way));
                }
            }
        }
        None
    }

    /// Looks up `va`. `asid` is accepted for call-site symmetry with
    /// [`super::AsidTlb::lookup`] but does not participate in matching.
    pub fn lookup(&self, va: u64, asid: u16) -> Option<TranslationEntry> {
        trace!("lookup va={va:#x} asid={asid}");
        let (set, way) = self.find(va)?;
        Some(self.table.slot(set, way).entry)
    }

    fn select_victim(&self, set_vector: &[usize]) -> usize {
        let mut valid = vec![false; self.table.ways];
        let mut seqs = vec![0u64; self.table.ways];
        for w in 0..self.table.ways {
            let slot = self.table.slot(set_vector[w], w);
            valid[w] = slot.valid;
            seqs[w] = slot.entry.lru_seq;
        }
        plain_lru::select_victim(&valid, &seqs)
    }

    /// Inserts `entry`, whose `lru_seq` the caller must have already
    /// stamped with its own monotonic clock. Unlike the per-ASID
    /// variant, the prior occupant's `lru_seq` is not preserved — the
    /// caller-supplied timestamp is trusted outright.
    pub fn insert(&mut self, entry: TranslationEntry) -> TranslationEntry {
        let log_bytes = entry.log_bytes;
        let base = page_base(entry.vaddr, log_bytes);
        let mut set_vector = self.set_vector(base, log_bytes);

        let mut way = (0..self.table.ways).find(|&w| !self.table.slot(set_vector[w], w).valid);

        if way.is_none() {
            self.evict_cnt += 1;
            if self.evict_cnt == MAX_EVICT {
                self.evict_cnt = 0;
                debug!("re-randomizing after {MAX_EVICT} full-set evictions");
                self.flush_all();
                set_vector = self.set_vector(base, log_bytes);
                way = (0..self.table.ways).find(|&w| !self.table.slot(set_vector[w], w).valid);
            }
        }

        let way = way.unwrap_or_else(|| self.select_victim(&set_vector));
        let set = set_vector[way];

        let mut stored = entry;
        stored.vaddr = base;
        let slot = self.table.slot_mut(set, way);
        slot.entry = stored;
        slot.valid = true;
        slot.entry
    }

    /// `asid` is accepted for call-site symmetry with
    /// [`super::AsidTlb::demap_page`] but does not participate in
    /// matching — see [`Self::find`].
    pub fn demap_page(&mut self, va: u64, asid: u16) {
        if let Some((set, way)) = self.find(va) {
            self.table.slot_mut(set, way).valid = false;
        }
    }

    pub fn demap_page_complex(&mut self, va: u64, asid: u32) {
        let asid = (asid & 0xFFFF) as u16;
        for (set, way) in self.table.iter_positions().collect::<Vec<_>>() {
            let slot = self.table.slot(set, way);
            if !slot.valid {
                continue;
            }
            let mask = !(slot.entry.size() - 1);
            let vaddr_matches = va == 0 || (va & mask) == slot.entry.vaddr;
            let asid_matches = asid == 0 || slot.entry.global || slot.entry.asid == asid;
            if vaddr_matches && asid_matches {
                self.table.slot_mut(set, way).valid = false;
            }
        }
    }

    /// Invalidates every entry whose `global` flag is unset, leaving
    /// global mappings resident. Rotates `random_id` but, unlike
    /// `flush_all`, does not touch `rerand_requests` — this is a
    /// narrower, architectural shootdown, not an epoch rotation.
    pub fn flush_non_global(&mut self) {
        self.global_page_max = self.global_page_max.max(self.count_global_pages());
        self.evict_cnt = 0;
        for (set, way) in self.table.iter_positions().collect::<Vec<_>>() {
            if !self.table.slot(set, way).entry.global {
                self.table.slot_mut(set, way).valid = false;
            }
        }
        self.random_id += 1;
    }

    /// Invalidates every entry and rotates `random_id`. This is the sole
    /// place `rerand_requests` is incremented, including the implicit
    /// call made from [`Self::insert`]'s bounded-eviction path — see
    /// DESIGN.md for why that isn't double-counted.
    pub fn flush_all(&mut self) {
        warn!("flush_all: invalidating {} slots", self.table.sets * self.table.ways);
        self.rerand_requests += 1;
        self.random_id += 1;
        self.evict_cnt = 0;
        self.table.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlb() -> GlobalTlb {
        GlobalTlb::new(Geometry::new(16, 4), IndexMode::Skewed, 0x0011_2233_4455_6677).unwrap()
    }

    fn small_entry(vaddr: u64, asid: u16, lru_seq: u64) -> TranslationEntry {
        let mut e = TranslationEntry::new(vaddr, asid, LOG_BYTES_SMALL_PAGE, false);
        e.lru_seq = lru_seq;
        e
    }

    #[test]
    fn rejects_zero_geometry() {
        assert_eq!(
            GlobalTlb::new(Geometry::new(0, 4), IndexMode::Skewed, 0).unwrap_err(),
            ConfigError::NoSets
        );
        assert_eq!(
            GlobalTlb::new(Geometry::new(4, 0), IndexMode::Skewed, 0).unwrap_err(),
            ConfigError::NoWays
        );
    }

    #[test]
    fn insert_then_lookup_hits() {
        let mut tlb = tlb();
        tlb.insert(small_entry(0x1000, 7, 1));
        let hit = tlb.lookup(0x1000, 7).expect("must hit");
        assert_eq!(hit.vaddr, 0x1000);
    }

    #[test]
    fn global_entry_matches_any_asid() {
        let mut tlb = tlb();
        let mut e = TranslationEntry::new(0x9000, 5, LOG_BYTES_SMALL_PAGE, true);
        e.lru_seq = 1;
        tlb.insert(e);
        assert!(tlb.lookup(0x9000, 99).is_some());
    }

    #[test]
    fn non_global_entry_is_visible_across_asids() {
        let mut tlb = tlb();
        tlb.insert(small_entry(0x1000, 7, 1));
        // Non-global entries carry no address-space scoping in this
        // variant: isolation is the caller's job via flush_non_global,
        // not a per-lookup asid filter.
        assert!(tlb.lookup(0x1000, 99).is_some());
    }

    #[test]
    fn demap_page_invalidates() {
        let mut tlb = tlb();
        tlb.insert(small_entry(0x2000, 3, 1));
        tlb.demap_page(0x2000, 3);
        assert!(tlb.lookup(0x2000, 3).is_none());
    }

    #[test]
    fn flush_non_global_keeps_global_entries() {
        let mut tlb = tlb();
        let mut g = TranslationEntry::new(0x6000, 1, LOG_BYTES_SMALL_PAGE, true);
        g.lru_seq = 1;
        tlb.insert(g);
        tlb.insert(small_entry(0x7000, 1, 2));
        tlb.flush_non_global();
        assert!(tlb.lookup(0x6000, 1).is_some());
        assert!(tlb.lookup(0x7000, 1).is_none());
    }

    #[test]
    fn flush_non_global_tracks_high_water_mark() {
        let mut tlb = tlb();
        let mut g = TranslationEntry::new(0x6000, 1, LOG_BYTES_SMALL_PAGE, true);
        g.lru_seq = 1;
        tlb.insert(g);
        tlb.flush_non_global();
        assert_eq!(tlb.global_page_max(), 1);
        tlb.flush_non_global();
        assert_eq!(tlb.global_page_max(), 1);
    }

    #[test]
    fn flush_all_bumps_random_id_once() {
        let mut tlb = tlb();
        let before = tlb.rerand_request_count();
        tlb.flush_all();
        assert_eq!(tlb.rerand_request_count(), before + 1);
        assert_eq!(tlb.random_id(), 1);
    }

    #[test]
    fn eviction_picks_lowest_lru_seq() {
        let mut tlb = GlobalTlb::new(Geometry::new(1, 4), IndexMode::PlainAssociative, 0).unwrap();
        tlb.insert(small_entry(0x1000, 1, 10));
        tlb.insert(small_entry(0x2000, 1, 3));
        tlb.insert(small_entry(0x3000, 1, 7));
        tlb.insert(small_entry(0x4000, 1, 20));
        // Set is full; this insert must evict the seq=3 entry.
        tlb.insert(small_entry(0x5000, 1, 30));
        assert!(tlb.lookup(0x2000, 1).is_none());
        assert!(tlb.lookup(0x1000, 1).is_some());
    }
}
