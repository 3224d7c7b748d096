//! Bounded circular job queue
//!
//! Design:
//! - Fixed array of `slot_count` slots, `head`/`tail` indices mod `slot_count`
//! - One slot always stays empty, so full is `(head + 1) % n == tail`
//!   and empty is `head == tail`
//! - Single mutex around the ring; it is never held while a job runs
//! - Ids are drawn under the lock, so they increase in FIFO order
//!
//! A full queue is backpressure: `try_push` hands the job back and the
//! producer yields and retries. The ring never grows.

use crate::error::ConfigError;
use crate::id::{IdGenerator, JobId};
use crate::job::Job;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ring storage, only touched under the queue lock
struct Ring {
    slots: Box<[Option<Job>]>,
    head: usize,
    tail: usize,
}

impl Ring {
    #[inline]
    fn next(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    #[inline]
    fn len(&self) -> usize {
        let n = self.slots.len();
        (self.head + n - self.tail) % n
    }
}

/// Fixed-capacity multi-producer job queue
pub struct JobQueue {
    ring: Mutex<Ring>,
    ids: IdGenerator,
    slot_count: usize,
    /// Occupancy mirror, written under the lock, readable without it
    len: AtomicUsize,
}

impl JobQueue {
    /// Create a queue with `slot_count` slots (`slot_count - 1` usable)
    pub fn new(slot_count: usize) -> Result<Self, ConfigError> {
        if slot_count < 2 {
            return Err(ConfigError::InvalidValue("queue_capacity must be >= 2"));
        }
        let slots: Box<[Option<Job>]> = (0..slot_count).map(|_| None).collect();
        Ok(Self {
            ring: Mutex::new(Ring { slots, head: 0, tail: 0 }),
            ids: IdGenerator::new(),
            slot_count,
            len: AtomicUsize::new(0),
        })
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Ring> {
        // Jobs never run under this lock, so a poisoned ring is still consistent.
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a job. On success the job's id is returned; when the queue is
    /// full the job is handed back untouched.
    pub fn try_push(&self, mut job: Job) -> Result<JobId, Job> {
        let mut ring = self.lock();
        let next = ring.next(ring.head);
        if next == ring.tail {
            return Err(job);
        }

        let id = self.ids.next_id();
        job.assign_id(id);
        let head = ring.head;
        ring.slots[head] = Some(job);
        ring.head = next;
        self.len.store(ring.len(), Ordering::Release);
        Ok(id)
    }

    /// Pop the oldest job
    ///
    /// The job is moved out of its slot before `tail` advances, so a
    /// concurrent push can never land on a slot that is still being read.
    pub fn pop(&self) -> Option<Job> {
        let mut ring = self.lock();
        if ring.head == ring.tail {
            return None;
        }

        let tail = ring.tail;
        let job = ring.slots[tail].take();
        ring.tail = ring.next(tail);
        self.len.store(ring.len(), Ordering::Release);
        job
    }

    /// Empty the queue, returning how many jobs were discarded
    ///
    /// Shutdown only. Discarded jobs are dropped after the lock is released
    /// so their captured state cannot run arbitrary drop code under it.
    pub fn reset(&self) -> usize {
        let discarded: Vec<Job> = {
            let mut ring = self.lock();
            let mut out = Vec::with_capacity(ring.len());
            while ring.head != ring.tail {
                let tail = ring.tail;
                if let Some(job) = ring.slots[tail].take() {
                    out.push(job);
                }
                ring.tail = ring.next(tail);
            }
            ring.head = 0;
            ring.tail = 0;
            self.len.store(0, Ordering::Release);
            out
        };
        discarded.len()
    }

    /// Current occupancy (exact at the instant of the last push/pop)
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most jobs the queue can hold at once
    #[inline]
    pub fn max_len(&self) -> usize {
        self.slot_count() - 1
    }

    /// Number of ring slots, including the one kept empty
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Total ids handed out
    #[inline]
    pub fn issued(&self) -> u64 {
        self.ids.issued()
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("len", &self.len())
            .field("issued", &self.issued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_queue::SegQueue;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    fn noop() -> Job {
        Job::new(|_| {})
    }

    #[test]
    fn test_rejects_tiny_capacity() {
        assert!(JobQueue::new(0).is_err());
        assert!(JobQueue::new(1).is_err());
        assert!(JobQueue::new(2).is_ok());
    }

    #[test]
    fn test_fifo_and_ids() {
        let q = JobQueue::new(8).unwrap();
        let a = q.try_push(noop()).unwrap();
        let b = q.try_push(noop()).unwrap();
        let c = q.try_push(noop()).unwrap();
        assert!(a < b && b < c);
        assert_eq!(q.len(), 3);

        assert_eq!(q.pop().map(|j| j.id()), Some(a));
        assert_eq!(q.pop().map(|j| j.id()), Some(b));
        assert_eq!(q.pop().map(|j| j.id()), Some(c));
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_full_boundary() {
        let q = JobQueue::new(4).unwrap();
        assert_eq!(q.max_len(), 3);
        for _ in 0..3 {
            assert!(q.try_push(noop()).is_ok());
        }
        assert_eq!(q.len(), 3);

        // At occupancy capacity-1 the push is refused and the job handed back.
        let rejected = q.try_push(noop());
        assert!(rejected.is_err());
        assert_eq!(q.len(), 3);
        assert_eq!(q.issued(), 3);

        // One pop frees exactly one slot.
        assert!(q.pop().is_some());
        assert!(q.try_push(noop()).is_ok());
        assert!(q.try_push(noop()).is_err());
    }

    #[test]
    fn test_wraparound() {
        let q = JobQueue::new(3).unwrap();
        let mut last = None;
        for _ in 0..10 {
            let id = q.try_push(noop()).unwrap();
            if let Some(prev) = last {
                assert!(id > prev);
            }
            last = Some(id);
            assert_eq!(q.pop().map(|j| j.id()), Some(id));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn test_reset_discards() {
        let q = JobQueue::new(16).unwrap();
        for _ in 0..5 {
            q.try_push(noop()).unwrap();
        }
        q.pop();
        assert_eq!(q.reset(), 4);
        assert!(q.is_empty());
        assert!(q.pop().is_none());

        // Usable again after reset, ids keep increasing.
        let id = q.try_push(noop()).unwrap();
        assert_eq!(id, JobId::new(5));
    }

    #[test]
    fn test_two_producers_race() {
        const SLOTS: usize = 64;
        let q = Arc::new(JobQueue::new(SLOTS).unwrap());
        let popped = Arc::new(SegQueue::new());
        let done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let (q, popped, done) = (Arc::clone(&q), Arc::clone(&popped), Arc::clone(&done));
            thread::spawn(move || {
                let mut max_seen = 0;
                loop {
                    max_seen = max_seen.max(q.len());
                    match q.pop() {
                        Some(job) => popped.push(job.id()),
                        None if done.load(Ordering::Acquire) && q.is_empty() => break,
                        None => thread::yield_now(),
                    }
                }
                max_seen
            })
        };

        let producers: Vec<_> = (0..2)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    let mut pushed = Vec::with_capacity(SLOTS);
                    for _ in 0..SLOTS {
                        let mut job = noop();
                        loop {
                            match q.try_push(job) {
                                Ok(id) => {
                                    pushed.push(id);
                                    break;
                                }
                                Err(back) => {
                                    job = back;
                                    thread::yield_now();
                                }
                            }
                        }
                        assert!(q.len() <= SLOTS - 1);
                    }
                    pushed
                })
            })
            .collect();

        let mut pushed = HashSet::new();
        for p in producers {
            for id in p.join().unwrap() {
                assert!(pushed.insert(id));
            }
        }
        done.store(true, Ordering::Release);
        let max_seen = consumer.join().unwrap();

        let mut seen = HashSet::new();
        while let Some(id) = popped.pop() {
            assert!(seen.insert(id), "job {} popped twice", id);
        }
        assert_eq!(pushed.len(), 2 * SLOTS);
        assert_eq!(seen, pushed);
        assert!(max_seen <= SLOTS - 1);
    }
}
