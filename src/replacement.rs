//! Replacement policies. The two cache variants use opposite `lru_seq`
//! orderings and it is easy to flip one by accident, so the contract is
//! spelled out loudly at each call site: tree-pLRU promotes, picks the
//! **maximum** rank to evict; plain LRU picks the **minimum** (oldest)
//! timestamp to evict. Do not unify these into one "pick an extreme"
//! helper — the per-variant meaning is the point.

/// Tree-pseudo-LRU over a four-way set. `ranks` holds each way's
/// `lru_seq`, a permutation of `{1,2,3,4}` (1 = MRU, 4 = LRU).
pub mod tplru {
    /// Promotes `way` to MRU, shuffling the rest of the permutation down.
    /// Panics (invariant violation) if the set was not a well-formed
    /// permutation to begin with.
    pub fn promote(ranks: &mut [u64; 4], way: usize) {
        if ranks[way] == 1 {
            return;
        }
        ranks[way] = 1;
        let mut seen = [false; 4];
        seen[way] = true;

        let Some(next) = (0..4).find(|&i| !seen[i] && ranks[i] == 1) else {
            panic!(
                "tPLRU invariant violation: no rank-1 way found after promoting way {way} (ranks={ranks:?})"
            );
        };
        ranks[next] = 2;
        seen[next] = true;

        let Some(next) = (0..4).find(|&i| !seen[i] && ranks[i] == 2) else {
            // Fewer than four distinct ranks were present (some ways were
            // freshly invalidated); nothing further to promote.
            return;
        };
        ranks[next] = 3;
        seen[next] = true;

        if let Some(next) = (0..4).find(|&i| !seen[i] && ranks[i] == 3) {
            ranks[next] = 4;
        }
    }

    /// Picks the way with the highest `lru_seq` (the coldest way) among
    /// the ways reported valid. Defaults to way 0; ties favor the lowest
    /// index.
    pub fn select_victim(valid: &[bool; 4], ranks: &[u64; 4]) -> usize {
        let mut victim = 0;
        for i in 1..4 {
            if valid[i] && ranks[i] > ranks[victim] {
                victim = i;
            }
        }
        victim
    }
}

/// Plain LRU: `lru_seq` is a monotonically increasing access timestamp
/// maintained by the caller (the host simulator), not by this module.
pub mod plain_lru {
    /// Picks the way with the lowest `lru_seq` (the oldest access) among
    /// the ways reported valid. Defaults to way 0; ties favor the lowest
    /// index.
    pub fn select_victim(valid: &[bool], seqs: &[u64]) -> usize {
        let mut victim = 0;
        for i in 1..seqs.len() {
            if valid[i] && seqs[i] < seqs[victim] {
                victim = i;
            }
        }
        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tplru_seeds_well_formed() {
        let ranks = [1u64, 2, 3, 4];
        let mut sorted = ranks;
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2, 3, 4]);
    }

    #[test]
    fn tplru_promote_is_noop_on_mru() {
        let mut ranks = [1u64, 2, 3, 4];
        tplru::promote(&mut ranks, 0);
        assert_eq!(ranks, [1, 2, 3, 4]);
    }

    #[test]
    fn tplru_promote_stays_a_permutation() {
        let mut ranks = [1u64, 2, 3, 4];
        tplru::promote(&mut ranks, 2);
        let mut sorted = ranks;
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2, 3, 4]);
        assert_eq!(ranks[2], 1);
    }

    #[test]
    fn tplru_promote_full_cycle() {
        let mut ranks = [1u64, 2, 3, 4];
        for way in [1, 2, 3, 0, 1] {
            tplru::promote(&mut ranks, way);
            let mut sorted = ranks;
            sorted.sort_unstable();
            assert_eq!(sorted, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn tplru_evicts_max_rank() {
        let valid = [true, true, true, true];
        let ranks = [3u64, 1, 4, 2];
        assert_eq!(tplru::select_victim(&valid, &ranks), 2);
    }

    #[test]
    fn tplru_skips_invalid_ways() {
        let valid = [true, false, true, true];
        let ranks = [1u64, 4, 3, 2];
        // way 1 has the highest rank but is invalid, so it must not win.
        assert_eq!(tplru::select_victim(&valid, &ranks), 2);
    }

    #[test]
    fn plain_lru_evicts_min_seq() {
        let valid = [true, true, true];
        let seqs = [10u64, 3, 7];
        assert_eq!(plain_lru::select_victim(&valid, &seqs), 1);
    }
}
