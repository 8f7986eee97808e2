//! Aggregate counters accumulated over a run, reported at the end of
//! [`crate::main`] — a plain struct with a `Display` impl, no metrics
//! crate.

use std::fmt;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub demaps: u64,
    pub flushes: u64,
    pub rerandomizations: u64,
}

impl Stats {
    pub fn record_lookup(&mut self, hit: bool) {
        self.lookups += 1;
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn record_insert(&mut self, evicted: bool) {
        self.inserts += 1;
        if evicted {
            self.evictions += 1;
        }
    }

    pub fn record_demap(&mut self) {
        self.demaps += 1;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lookups={} hits={} misses={} hit_rate={:.3} inserts={} evictions={} \
             demaps={} flushes={} rerandomizations={}",
            self.lookups,
            self.hits,
            self.misses,
            self.hit_rate(),
            self.inserts,
            self.evictions,
            self.demaps,
            self.flushes,
            self.rerandomizations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_with_no_lookups_is_zero() {
        assert_eq!(Stats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_tracks_recorded_lookups() {
        let mut stats = Stats::default();
        stats.record_lookup(true);
        stats.record_lookup(false);
        stats.record_lookup(true);
        assert!((stats.hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }
}
