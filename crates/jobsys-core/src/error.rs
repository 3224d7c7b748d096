//! Error types for the jobsys scheduler

use std::io;
use thiserror::Error;

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can surface from the scheduler
///
/// A full queue is not among them: submission retries until the push lands.
#[derive(Debug, Error)]
pub enum SchedError {
    /// The scheduler has been shut down; nothing more will run
    #[error("scheduler is shut down")]
    ShutDown,

    /// Configuration rejected at init
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Worker thread error
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    InvalidValue(&'static str),
}

/// Worker thread related errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Failed to spawn worker thread
    #[error("failed to spawn worker {index}: {source}")]
    SpawnFailed {
        index: u32,
        #[source]
        source: io::Error,
    },

    /// Failed to pin a worker to its CPU
    #[error("failed to pin thread to cpu {cpu}: {reason}")]
    AffinityFailed { cpu: usize, reason: String },

    /// Affinity is not available on this platform
    #[error("thread affinity is not supported on this platform")]
    AffinityUnsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", SchedError::ShutDown), "scheduler is shut down");

        let e: SchedError = ConfigError::InvalidValue("queue_capacity must be >= 2").into();
        assert_eq!(format!("{}", e), "invalid config: queue_capacity must be >= 2");

        let e = WorkerError::AffinityFailed { cpu: 3, reason: "EINVAL".into() };
        assert_eq!(format!("{}", e), "failed to pin thread to cpu 3: EINVAL");
    }

    #[test]
    fn test_error_conversion() {
        let worker_err = WorkerError::SpawnFailed {
            index: 2,
            source: io::Error::new(io::ErrorKind::Other, "no threads"),
        };
        let sched_err: SchedError = worker_err.into();
        assert!(matches!(sched_err, SchedError::Worker(WorkerError::SpawnFailed { index: 2, .. })));
        assert!(std::error::Error::source(&sched_err).is_some());
    }
}
