//! Linux affinity via `sched_setaffinity(2)`

use jobsys_core::WorkerError;
use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
use nix::unistd::Pid;

pub(super) const SUPPORTED: bool = true;

/// Largest CPU id a `cpu_set_t` can describe
const CPU_SET_CAPACITY: usize = libc::CPU_SETSIZE as usize;

pub(super) fn pin_current_thread(cpu: usize) -> Result<(), WorkerError> {
    if cpu >= CPU_SET_CAPACITY {
        return Err(WorkerError::AffinityFailed {
            cpu,
            reason: format!("cpu index exceeds CPU_SETSIZE ({})", CPU_SET_CAPACITY),
        });
    }

    let mut set = CpuSet::new();
    set.set(cpu).map_err(|e| WorkerError::AffinityFailed {
        cpu,
        reason: e.to_string(),
    })?;

    // Pid 0 is the calling thread.
    sched_setaffinity(Pid::from_raw(0), &set).map_err(|e| WorkerError::AffinityFailed {
        cpu,
        reason: e.to_string(),
    })
}

pub(super) fn allowed_cpus() -> Option<Vec<usize>> {
    let set = sched_getaffinity(Pid::from_raw(0)).ok()?;
    let cpus: Vec<usize> = (0..CpuSet::count())
        .filter(|&cpu| set.is_set(cpu).unwrap_or(false))
        .collect();
    Some(cpus)
}
