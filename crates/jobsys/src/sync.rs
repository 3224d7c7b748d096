//! Caller-side synchronization
//!
//! The scheduler only reports job ids. Code that needs to wait for a set of
//! jobs arms a `JobLatch` with the expected count and counts it down from the
//! job bodies or their completion callbacks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Countdown latch
///
/// `wait` returns once `count_down` has been called as many times as the
/// latch was armed with. Extra calls are ignored.
#[derive(Debug)]
pub struct JobLatch {
    remaining: AtomicUsize,
    lock: Mutex<()>,
    cond: Condvar,
}

impl JobLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Record one finished unit; wakes waiters when the count reaches zero
    pub fn count_down(&self) {
        let prev = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if prev == Ok(1) {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.cond.notify_all();
        }
    }

    /// Units still outstanding
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.remaining() == 0
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !self.is_released() {
            guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the count reaches zero or `timeout` passes; returns
    /// whether the latch was released
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !self.is_released() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .cond
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_latch_is_open() {
        let latch = JobLatch::new(0);
        assert!(latch.is_released());
        latch.wait();
        latch.count_down();
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn test_wait_for_threads() {
        let latch = Arc::new(JobLatch::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let l = Arc::clone(&latch);
                thread::spawn(move || l.count_down())
            })
            .collect();
        latch.wait();
        assert!(latch.is_released());
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_wait_timeout_expires() {
        let latch = JobLatch::new(2);
        latch.count_down();
        assert!(!latch.wait_timeout(Duration::from_millis(20)));
        assert_eq!(latch.remaining(), 1);
        latch.count_down();
        assert!(latch.wait_timeout(Duration::from_millis(20)));
    }
}
