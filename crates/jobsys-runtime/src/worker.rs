//! Worker thread management
//!
//! Workers are OS threads created once at init and joined at shutdown.
//! Each worker has a `WorkerState` record that the scheduler updates and
//! `Scheduler::worker_stats` snapshots.

use jobsys_core::WorkerError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// Per-worker bookkeeping, cache-line aligned to keep counters apart
#[repr(C, align(64))]
#[derive(Debug)]
pub struct WorkerState {
    index: u32,
    /// CPU the worker was asked to run on
    target_cpu: Option<usize>,
    pinned: AtomicBool,
    parked: AtomicBool,
    executed: AtomicU64,
    panicked: AtomicU64,
}

impl WorkerState {
    pub fn new(index: u32, target_cpu: Option<usize>) -> Self {
        Self {
            index,
            target_cpu,
            pinned: AtomicBool::new(false),
            parked: AtomicBool::new(false),
            executed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn target_cpu(&self) -> Option<usize> {
        self.target_cpu
    }

    #[inline]
    pub(crate) fn set_pinned(&self, pinned: bool) {
        self.pinned.store(pinned, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_parked(&self, parked: bool) {
        self.parked.store(parked, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_job(&self, panicked: bool) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        if panicked {
            self.panicked.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            index: self.index,
            cpu: self
                .target_cpu
                .filter(|_| self.pinned.load(Ordering::Relaxed)),
            parked: self.parked.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub index: u32,
    /// CPU the worker is pinned to, `None` if unpinned
    pub cpu: Option<usize>,
    pub parked: bool,
    pub executed: u64,
    pub panicked: u64,
}

/// Pool of worker threads
pub struct WorkerPool {
    /// Join handles for worker threads
    handles: Vec<JoinHandle<()>>,

    /// Number of workers to run
    num_workers: usize,
}

impl WorkerPool {
    /// Create a new, not yet started, worker pool
    pub fn new(num_workers: usize) -> Self {
        Self {
            handles: Vec::with_capacity(num_workers),
            num_workers,
        }
    }

    /// Start all worker threads
    ///
    /// Threads are named `<name_prefix>-<index>`. On a spawn failure the
    /// threads already started are left running; the caller must signal
    /// shutdown and `join`.
    pub fn start<F>(
        &mut self,
        name_prefix: &str,
        stack_size: Option<usize>,
        worker_fn: F,
    ) -> Result<(), WorkerError>
    where
        F: Fn(u32) + Send + Sync + Clone + 'static,
    {
        for i in 0..self.num_workers as u32 {
            let worker_fn = worker_fn.clone();

            let mut builder = thread::Builder::new().name(format!("{}-{}", name_prefix, i));
            if let Some(size) = stack_size {
                builder = builder.stack_size(size);
            }

            let handle = builder
                .spawn(move || worker_fn(i))
                .map_err(|source| WorkerError::SpawnFailed { index: i, source })?;

            self.handles.push(handle);
        }
        Ok(())
    }

    /// Wait for all workers to finish; returns how many panicked
    pub fn join(self) -> usize {
        self.handles
            .into_iter()
            .map(|h| h.join())
            .filter(Result::is_err)
            .count()
    }

    /// Get number of workers
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of threads actually spawned
    #[inline]
    pub fn started(&self) -> usize {
        self.handles.len()
    }
}
