//! Thread-to-CPU pinning
//!
//! Workers pin themselves from inside their own thread at startup.
//! Platform-specific implementations are selected at compile time; targets
//! without per-thread affinity report `AffinityUnsupported` and the pool
//! runs unpinned.

use jobsys_core::WorkerError;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        use linux as platform;
    } else {
        mod fallback;
        use fallback as platform;
    }
}

/// Pin the calling thread to logical CPU `cpu`
#[inline]
pub fn pin_current_thread(cpu: usize) -> Result<(), WorkerError> {
    platform::pin_current_thread(cpu)
}

/// Logical CPUs the process is allowed to run on, if the platform says
#[inline]
pub fn allowed_cpus() -> Option<Vec<usize>> {
    platform::allowed_cpus()
}

/// Whether pinning does anything on this platform
#[inline]
pub const fn is_supported() -> bool {
    platform::SUPPORTED
}
