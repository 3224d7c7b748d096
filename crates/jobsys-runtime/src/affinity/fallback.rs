//! Targets without per-thread affinity (macOS only offers hints, others vary)

use jobsys_core::WorkerError;

pub(super) const SUPPORTED: bool = false;

pub(super) fn pin_current_thread(_cpu: usize) -> Result<(), WorkerError> {
    Err(WorkerError::AffinityUnsupported)
}

pub(super) fn allowed_cpus() -> Option<Vec<usize>> {
    None
}
