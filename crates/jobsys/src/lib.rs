//! # jobsys - Job Scheduler
//!
//! Fixed pool of CPU-pinned worker threads fed from one bounded FIFO queue.
//!
//! ## Features
//!
//! - **Pinned workers**: one per core minus one, spread across physical cores
//! - **Bounded queue**: producers yield and retry while it is full
//! - **Batch dispatch**: `count` items split into one contiguous share per worker
//! - **Completion callbacks**: id-only, fired on the worker after the body
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobsys::{run_with, JobLatch, SchedulerConfig};
//! use std::sync::Arc;
//!
//! fn main() {
//!     run_with(SchedulerConfig::from_env(), |sched| {
//!         let latch = Arc::new(JobLatch::new(1));
//!         let l = Arc::clone(&latch);
//!         sched.submit_batch(10_000, |ctx, i| {
//!             // per-item work, ctx.worker_slot() indexes per-worker scratch
//!         }, Some(Box::new(move |_| l.count_down())))?;
//!         latch.wait();
//!         Ok(())
//!     })
//!     .unwrap();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Producer threads                       │
//! │           submit_one(), submit_batch(), JobLatch            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ push, then notify
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 JobQueue (ring, C-1 usable)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ pop under wake lock
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────┐
//!    │  Worker 0 │      │  Worker 1 │      │  Worker N │
//!    │  cpu s*1  │      │  cpu s*2  │      │ cpu s*N+s │
//!    └───────────┘      └───────────┘      └───────────┘
//! ```

pub mod sync;

// Re-export core types
pub use jobsys_core::{
    BatchPlan,
    CompletionFn,
    ConfigError,
    JobContext,
    JobId,
    SchedError,
    SchedResult,
    WorkerError,
};
pub use jobsys_core::constants::NOT_A_WORKER;

// Re-export env utilities
pub use jobsys_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use jobsys_runtime::{
    current_worker_index,
    try_current_worker_index,
    CpuTopology,
    Scheduler,
    SchedulerConfig,
    SchedulerStats,
    WorkerStats,
};

pub use sync::JobLatch;

/// Start a scheduler, run `f` against it, then shut it down
///
/// This is the typical entry point for applications. The scheduler is shut
/// down even when `f` returns an error; queued jobs not yet started are
/// discarded, so `f` should wait for whatever it needs before returning.
pub fn run_with<F, T>(config: SchedulerConfig, f: F) -> SchedResult<T>
where
    F: FnOnce(&Scheduler) -> SchedResult<T>,
{
    let scheduler = Scheduler::init(config)?;
    let result = f(&scheduler);
    scheduler.shutdown();
    result
}
