//! Job identifier type and sequence generator

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a submitted job
///
/// Ids are sequence numbers handed out in queue order, so a larger id was
/// always queued later. The maximum value (u64::MAX) is reserved as a
/// sentinel for "no job".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Sentinel value indicating no job
    pub const NONE: JobId = JobId(u64::MAX);

    /// Create a new JobId from a raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        JobId(id)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }

    /// Check if this is a real job id
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u64::MAX
    }
}

impl From<u64> for JobId {
    #[inline]
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

impl From<JobId> for u64 {
    #[inline]
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "JobId(NONE)")
        } else {
            write!(f, "JobId({})", self.0)
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl Default for JobId {
    fn default() -> Self {
        JobId::NONE
    }
}

/// Monotonic job id source
///
/// The queue draws from this while holding its lock, which is what makes
/// ids strictly increase in FIFO order. The atomic keeps `issued` lock-free.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Start a generator at zero
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Hand out the next id
    #[inline]
    pub fn next_id(&self) -> JobId {
        JobId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far
    #[inline]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
