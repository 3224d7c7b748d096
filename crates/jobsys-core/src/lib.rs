//! # jobsys-core
//!
//! Core types for the jobsys job scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Worker threads, parking, and CPU affinity live in `jobsys-runtime`.
//!
//! ## Modules
//!
//! - `id` - Job identifier and sequence generator
//! - `job` - Job record, execution context, lifecycle states
//! - `queue` - Bounded circular job queue
//! - `batch` - Batch split arithmetic (per-worker shares)
//! - `error` - Error types
//! - `env` - Environment variable utilities

pub mod id;
pub mod job;
pub mod queue;
pub mod batch;
pub mod error;
pub mod env;

// Re-exports for convenience
pub use id::{IdGenerator, JobId};
pub use job::{CompletionFn, Job, JobContext, JobFn, JobOutcome, JobState};
pub use queue::JobQueue;
pub use batch::BatchPlan;
pub use error::{ConfigError, SchedError, SchedResult, WorkerError};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

/// Scheduler-wide constants
pub mod constants {
    /// Default number of ring slots in the job queue (one is kept empty)
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

    /// Maximum workers (OS threads)
    pub const MAX_WORKERS: usize = 256;

    /// Sentinel returned by worker-index queries off a worker thread
    pub const NOT_A_WORKER: u32 = u32::MAX;

    /// Cache line size for alignment
    pub const CACHE_LINE_SIZE: usize = 64;
}
