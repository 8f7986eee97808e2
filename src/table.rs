//! The physical slot table shared by both TLB variants: a single
//! contiguous buffer of `sets * ways` records, indexed arithmetically.
//! This is the sole owner of cache state; callers never see raw
//! pointers into it (see [`crate::entry::TranslationEntry`] docs).

use crate::entry::TranslationEntry;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Slot {
    pub valid: bool,
    pub entry: TranslationEntry,
}

impl Slot {
    fn seeded(lru_seq: u64) -> Self {
        Slot {
            valid: false,
            entry: TranslationEntry {
                vaddr: 0,
                asid: 0,
                log_bytes: 0,
                global: false,
                lru_seq,
            },
        }
    }
}

pub(crate) struct Table {
    pub sets: usize,
    pub ways: usize,
    slots: Vec<Slot>,
}

impl Table {
    /// Builds the table with per-way `lru_seq` seeded via `seed`, so
    /// replacement state is well-formed from the outset.
    pub fn new(sets: usize, ways: usize, seed: impl Fn(usize) -> u64) -> Self {
        let mut slots = Vec::with_capacity(sets * ways);
        for _set in 0..sets {
            for way in 0..ways {
                slots.push(Slot::seeded(seed(way)));
            }
        }
        Table { sets, ways, slots }
    }

    fn index(&self, set: usize, way: usize) -> usize {
        debug_assert!(set < self.sets && way < self.ways);
        set * self.ways + way
    }

    pub fn slot(&self, set: usize, way: usize) -> &Slot {
        &self.slots[self.index(set, way)]
    }

    pub fn slot_mut(&mut self, set: usize, way: usize) -> &mut Slot {
        let idx = self.index(set, way);
        &mut self.slots[idx]
    }

    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.valid = false;
        }
    }

    /// Iterates every physical `(set, way)` pair in the table.
    pub fn iter_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let ways = self.ways;
        (0..self.sets).flat_map(move |set| (0..ways).map(move |way| (set, way)))
    }
}
