//! Thread-local worker identity
//!
//! Job bodies get their worker index through `JobContext`. This lookup only
//! backs `current_worker_index()` for code that cannot thread the context
//! through.

use jobsys_core::constants::NOT_A_WORKER;
use std::cell::Cell;

thread_local! {
    /// Worker index for this OS thread
    static WORKER_INDEX: Cell<u32> = const { Cell::new(NOT_A_WORKER) };

    /// Token of the scheduler owning this worker, 0 off-worker
    static WORKER_OWNER: Cell<usize> = const { Cell::new(0) };
}

/// Set the worker index and owning scheduler for the calling thread
#[inline]
pub(crate) fn set_worker_index(index: u32, owner: usize) {
    WORKER_INDEX.with(|cell| cell.set(index));
    WORKER_OWNER.with(|cell| cell.set(owner));
}

/// Forget the worker index (worker exiting)
#[inline]
pub(crate) fn clear_worker_index() {
    WORKER_INDEX.with(|cell| cell.set(NOT_A_WORKER));
    WORKER_OWNER.with(|cell| cell.set(0));
}

/// Whether the calling thread is a worker of the scheduler tagged `owner`
#[inline]
pub(crate) fn is_worker_of(owner: usize) -> bool {
    owner != 0 && WORKER_OWNER.with(|cell| cell.get()) == owner
}

/// Index of the worker running the calling thread, or `NOT_A_WORKER`
#[inline]
pub fn current_worker_index() -> u32 {
    WORKER_INDEX.with(|cell| cell.get())
}

/// Try to get the current worker index, `None` off a worker thread
#[inline]
pub fn try_current_worker_index() -> Option<u32> {
    let index = current_worker_index();
    if index == NOT_A_WORKER {
        None
    } else {
        Some(index)
    }
}

/// Whether the calling thread is a scheduler worker
#[inline]
pub fn is_worker_thread() -> bool {
    current_worker_index() != NOT_A_WORKER
}
