//! Worker park/wake signaling
//!
//! A mutex + condvar pair used only to put idle workers to sleep and wake
//! them when work arrives. It guards no data; the job queue has its own lock.
//!
//! Protocol:
//! - A worker takes the wake lock, checks the queue, and parks on the
//!   condvar only if the queue is empty. It then pops under the queue lock
//!   while still holding the wake lock.
//! - A producer pushes first (queue lock only), then takes the wake lock to
//!   notify. Because the worker holds the wake lock from its emptiness check
//!   until it is parked, the notify cannot fall between the two.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Park/wake pair for idle workers
pub struct WakeSignal {
    lock: Mutex<()>,
    cond: Condvar,
    /// Workers currently parked; only changed under `lock`
    parked: AtomicUsize,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }

    /// Acquire the wake lock
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park until notified, releasing the wake lock while asleep
    ///
    /// May return spuriously; callers re-check the queue either way.
    pub fn park<'a>(&self, guard: MutexGuard<'a, ()>) -> MutexGuard<'a, ()> {
        self.parked.fetch_add(1, Ordering::Relaxed);
        let guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        self.parked.fetch_sub(1, Ordering::Relaxed);
        guard
    }

    /// Wake one parked worker (one job was added)
    pub fn wake_one(&self) {
        let _guard = self.lock();
        if self.parked.load(Ordering::Relaxed) > 0 {
            self.cond.notify_one();
        }
    }

    /// Wake every parked worker (a batch was added, or shutdown)
    pub fn wake_all(&self) {
        let _guard = self.lock();
        if self.parked.load(Ordering::Relaxed) > 0 {
            self.cond.notify_all();
        }
    }

    /// Number of currently parked workers (hint, may be stale)
    #[inline]
    pub fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WakeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeSignal")
            .field("parked", &self.parked_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Park until `flag` is set, mirroring the worker's check-then-park.
    fn park_until(signal: &WakeSignal, flag: &AtomicBool) {
        let mut guard = signal.lock();
        while !flag.load(Ordering::Acquire) {
            guard = signal.park(guard);
        }
    }

    fn wait_for_parked(signal: &WakeSignal, n: usize) {
        let start = Instant::now();
        while signal.parked_count() < n {
            assert!(start.elapsed() < Duration::from_secs(5), "workers never parked");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_wake_one() {
        let signal = Arc::new(WakeSignal::new());
        let flag = Arc::new(AtomicBool::new(false));

        let handle = {
            let (signal, flag) = (Arc::clone(&signal), Arc::clone(&flag));
            thread::spawn(move || park_until(&signal, &flag))
        };

        wait_for_parked(&signal, 1);
        flag.store(true, Ordering::Release);
        signal.wake_one();
        handle.join().unwrap();
        assert_eq!(signal.parked_count(), 0);
    }

    #[test]
    fn test_wake_all() {
        let signal = Arc::new(WakeSignal::new());
        let flag = Arc::new(AtomicBool::new(false));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let (signal, flag) = (Arc::clone(&signal), Arc::clone(&flag));
                thread::spawn(move || park_until(&signal, &flag))
            })
            .collect();

        wait_for_parked(&signal, 4);
        flag.store(true, Ordering::Release);
        signal.wake_all();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(signal.parked_count(), 0);
    }

    #[test]
    fn test_wake_without_waiters_is_noop() {
        let signal = WakeSignal::new();
        signal.wake_one();
        signal.wake_all();
        assert_eq!(signal.parked_count(), 0);
    }
}
