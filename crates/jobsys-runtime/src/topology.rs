//! CPU topology and worker placement
//!
//! Sizing rule: one worker per available core, minus one core left to the
//! producer (main) thread, never fewer than one worker.
//!
//! Placement rule: stride 1 when logical cores are requested or there is no
//! SMT, stride 2 otherwise, so workers land on distinct physical cores before
//! doubling up on hyperthread siblings. Worker `i` targets logical CPU
//! `stride * (i + 1)`; CPU 0 stays with the main thread. Targets are mapped
//! into the process's allowed CPU set, which matters under cgroups/cpusets.

use crate::affinity;
use sysinfo::System;

/// Snapshot of the machine's CPU layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTopology {
    logical: usize,
    physical: usize,
    /// Logical CPU ids this process may run on, ascending
    allowed: Vec<usize>,
}

impl CpuTopology {
    /// Query the running machine
    pub fn detect() -> Self {
        let logical = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let physical = System::physical_core_count()
            .filter(|&n| n > 0)
            .unwrap_or(logical)
            .min(logical);
        let allowed = affinity::allowed_cpus()
            .filter(|cpus| !cpus.is_empty())
            .unwrap_or_else(|| (0..logical).collect());

        let topo = Self { logical, physical, allowed };
        log::debug!(
            "cpu topology: {} logical, {} physical, {} allowed",
            topo.logical,
            topo.physical,
            topo.allowed.len()
        );
        topo
    }

    /// Build a topology by hand (tests, headless tools)
    pub fn new(logical: usize, physical: usize) -> Self {
        let logical = logical.max(1);
        Self {
            logical,
            physical: physical.clamp(1, logical),
            allowed: (0..logical).collect(),
        }
    }

    /// Restrict placement to an explicit CPU set
    pub fn with_allowed(mut self, mut allowed: Vec<usize>) -> Self {
        allowed.sort_unstable();
        allowed.dedup();
        if !allowed.is_empty() {
            self.allowed = allowed;
        }
        self
    }

    #[inline]
    pub fn logical_cpus(&self) -> usize {
        self.logical
    }

    #[inline]
    pub fn physical_cores(&self) -> usize {
        self.physical
    }

    #[inline]
    pub fn allowed_cpus(&self) -> &[usize] {
        &self.allowed
    }

    /// Whether hyperthread siblings exist
    #[inline]
    pub fn has_smt(&self) -> bool {
        self.logical != self.physical
    }

    /// Cores the pool is sized from
    #[inline]
    pub fn available_cores(&self, use_logical: bool) -> usize {
        if use_logical {
            self.logical
        } else {
            self.physical
        }
    }

    /// `max(1, available_cores - 1)`
    #[inline]
    pub fn default_worker_count(&self, use_logical: bool) -> usize {
        self.available_cores(use_logical).saturating_sub(1).max(1)
    }

    /// Distance between consecutive worker CPUs
    #[inline]
    pub fn stride(&self, use_logical: bool) -> usize {
        if use_logical || !self.has_smt() {
            1
        } else {
            2
        }
    }

    /// CPU that worker `index` should be pinned to
    pub fn worker_cpu(&self, index: usize, use_logical: bool) -> usize {
        let target = self.stride(use_logical) * (index + 1);
        self.allowed[target % self.allowed.len()]
    }

    /// Placement for a whole pool
    pub fn placement(&self, workers: usize, use_logical: bool) -> Vec<usize> {
        (0..workers).map(|i| self.worker_cpu(i, use_logical)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_worker_count() {
        let smt = CpuTopology::new(16, 8);
        assert_eq!(smt.default_worker_count(false), 7);
        assert_eq!(smt.default_worker_count(true), 15);

        let single = CpuTopology::new(1, 1);
        assert_eq!(single.default_worker_count(false), 1);
        assert_eq!(single.default_worker_count(true), 1);

        let dual = CpuTopology::new(2, 2);
        assert_eq!(dual.default_worker_count(false), 1);
    }

    #[test]
    fn test_stride() {
        let smt = CpuTopology::new(16, 8);
        assert!(smt.has_smt());
        assert_eq!(smt.stride(false), 2);
        assert_eq!(smt.stride(true), 1);

        let no_smt = CpuTopology::new(8, 8);
        assert!(!no_smt.has_smt());
        assert_eq!(no_smt.stride(false), 1);
    }

    #[test]
    fn test_placement_distinct_physical_first() {
        let smt = CpuTopology::new(16, 8);
        let workers = smt.default_worker_count(false);
        let cpus = smt.placement(workers, false);
        assert_eq!(cpus, vec![2, 4, 6, 8, 10, 12, 14]);

        let distinct: HashSet<_> = cpus.iter().collect();
        assert_eq!(distinct.len(), cpus.len());
        assert!(!cpus.contains(&0), "cpu 0 stays with the main thread");
    }

    #[test]
    fn test_placement_no_smt() {
        let topo = CpuTopology::new(4, 4);
        assert_eq!(topo.placement(3, false), vec![1, 2, 3]);
    }

    #[test]
    fn test_placement_respects_allowed_set() {
        let topo = CpuTopology::new(64, 64).with_allowed(vec![7, 4, 5, 6]);
        let cpus = topo.placement(3, false);
        assert_eq!(cpus, vec![5, 6, 7]);
        assert!(cpus.iter().all(|c| topo.allowed_cpus().contains(c)));
    }

    #[test]
    fn test_physical_clamped_to_logical() {
        let topo = CpuTopology::new(4, 9);
        assert_eq!(topo.physical_cores(), 4);
        let topo = CpuTopology::new(4, 0);
        assert_eq!(topo.physical_cores(), 1);
    }

    #[test]
    fn test_detect_is_sane() {
        let topo = CpuTopology::detect();
        assert!(topo.logical_cpus() >= 1);
        assert!(topo.physical_cores() >= 1);
        assert!(topo.physical_cores() <= topo.logical_cpus());
        assert!(!topo.allowed_cpus().is_empty());
        assert!(topo.default_worker_count(false) >= 1);
    }
}
