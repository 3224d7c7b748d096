//! Batch split arithmetic
//!
//! A batch of `count` homogeneous items is split into at most one share per
//! worker. Each share covers a contiguous index range and becomes a single
//! queued job.
//!
//! ```text
//! dispatches = min(count, workers)
//! base       = count / dispatches
//! remainder  = count - base * dispatches
//! ```
//!
//! The first `remainder` shares take `base + 1` items, the rest take `base`.
//! The remainder is front-loaded rather than dealt round-robin, so shares stay
//! contiguous.

use std::ops::Range;

/// How a batch is cut into per-worker shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    count: usize,
    dispatches: usize,
    base: usize,
    remainder: usize,
}

impl BatchPlan {
    /// Plan `count` items across `workers` workers
    ///
    /// `workers` of zero is treated as one. A `count` of zero yields an empty
    /// plan with no shares.
    pub fn new(count: usize, workers: usize) -> Self {
        let dispatches = count.min(workers.max(1));
        if dispatches == 0 {
            return Self { count: 0, dispatches: 0, base: 0, remainder: 0 };
        }
        let base = count / dispatches;
        let remainder = count - base * dispatches;
        Self { count, dispatches, base, remainder }
    }

    /// Total items
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of shares (queued jobs)
    #[inline]
    pub fn dispatches(&self) -> usize {
        self.dispatches
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dispatches == 0
    }

    /// Items in share `i`
    #[inline]
    pub fn share_len(&self, i: usize) -> usize {
        debug_assert!(i < self.dispatches);
        if i < self.remainder {
            self.base + 1
        } else {
            self.base
        }
    }

    /// Index range covered by share `i`
    pub fn share(&self, i: usize) -> Range<usize> {
        // Shares before `i` that got the extra item.
        let extra_before = i.min(self.remainder);
        let start = i * self.base + extra_before;
        start..start + self.share_len(i)
    }

    /// All share ranges in submission order
    pub fn shares(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.dispatches).map(move |i| self.share(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(plan: &BatchPlan) -> Vec<usize> {
        plan.shares().map(|r| r.len()).collect()
    }

    #[test]
    fn test_seven_over_three() {
        let plan = BatchPlan::new(7, 3);
        assert_eq!(plan.dispatches(), 3);
        assert_eq!(sizes(&plan), vec![3, 2, 2]);

        let ranges: Vec<_> = plan.shares().collect();
        assert_eq!(ranges, vec![0..3, 3..5, 5..7]);
    }

    #[test]
    fn test_fewer_items_than_workers() {
        let plan = BatchPlan::new(2, 8);
        assert_eq!(plan.dispatches(), 2);
        assert_eq!(sizes(&plan), vec![1, 1]);
    }

    #[test]
    fn test_front_loaded_remainder() {
        let plan = BatchPlan::new(11, 4);
        assert_eq!(sizes(&plan), vec![3, 3, 3, 2]);

        let plan = BatchPlan::new(9, 4);
        assert_eq!(sizes(&plan), vec![3, 2, 2, 2]);
    }

    #[test]
    fn test_empty_and_degenerate() {
        let plan = BatchPlan::new(0, 4);
        assert!(plan.is_empty());
        assert_eq!(plan.shares().count(), 0);

        let plan = BatchPlan::new(5, 0);
        assert_eq!(plan.dispatches(), 1);
        assert_eq!(sizes(&plan), vec![5]);
    }

    #[test]
    fn test_every_index_covered_once() {
        for count in 0..64 {
            for workers in 1..12 {
                let plan = BatchPlan::new(count, workers);
                let mut hits = vec![0u8; count];
                let mut next_start = 0;
                for range in plan.shares() {
                    assert_eq!(range.start, next_start, "shares must be contiguous");
                    next_start = range.end;
                    for i in range {
                        hits[i] += 1;
                    }
                }
                assert!(hits.iter().all(|&h| h == 1), "count={} workers={}", count, workers);
                assert!(plan.dispatches() <= workers);
            }
        }
    }
}
