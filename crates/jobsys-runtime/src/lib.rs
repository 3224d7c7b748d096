//! # jobsys-runtime
//!
//! Platform-specific runtime for the jobsys scheduler.
//!
//! This crate provides:
//! - Worker thread management and the worker main loop
//! - Park/wake signaling for idle workers
//! - CPU topology detection and worker placement
//! - Thread-to-CPU pinning (Linux; a logged no-op elsewhere)
//! - Single-job and batch dispatch

pub mod config;
pub mod topology;
pub mod affinity;
pub mod wake;
pub mod tls;
pub mod worker;
mod dispatch;
pub mod scheduler;

// Re-exports
pub use config::SchedulerConfig;
pub use scheduler::{Scheduler, SchedulerStats};
pub use topology::CpuTopology;
pub use worker::{WorkerPool, WorkerStats};
pub use wake::WakeSignal;
pub use tls::{current_worker_index, is_worker_thread, try_current_worker_index};
