//! Batch dispatch shares
//!
//! `submit_batch` cuts a batch into contiguous shares (see `BatchPlan`) and
//! queues one job per share. All shares of a batch point at one `BatchState`
//! holding the item body and the outstanding-item count.
//!
//! Completion: `remaining` starts at `count + 1`. Shares subtract their item
//! count when they finish; the submitter holds the extra unit until every
//! share is queued and the batch's end id is known. Whoever brings the count
//! to zero fires the completion callback with the end id.

use jobsys_core::{CompletionFn, Job, JobContext, JobId};

use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// State shared by all shares of one batch
pub(crate) struct BatchState<F> {
    work: F,
    remaining: AtomicUsize,
    end_id: AtomicU64,
    on_complete: Mutex<Option<CompletionFn>>,
}

impl<F> BatchState<F>
where
    F: Fn(&JobContext, usize) + Send + Sync + 'static,
{
    pub(crate) fn new(work: F, count: usize, on_complete: Option<CompletionFn>) -> Arc<Self> {
        Arc::new(Self {
            work,
            remaining: AtomicUsize::new(count + 1),
            end_id: AtomicU64::new(JobId::NONE.as_u64()),
            on_complete: Mutex::new(on_complete),
        })
    }

    /// Release the submitter's unit once the last share is queued
    pub(crate) fn seal(&self, end_id: JobId) {
        self.end_id.store(end_id.as_u64(), Ordering::Relaxed);
        self.finish(1);
    }

    fn finish(&self, items: usize) {
        if self.remaining.fetch_sub(items, Ordering::AcqRel) != items {
            return;
        }
        let end_id = JobId::new(self.end_id.load(Ordering::Relaxed));
        let done = self
            .on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        log::trace!("batch {} completed", end_id);
        if let Some(done) = done {
            done(end_id);
        }
    }
}

/// One queued slice of a batch
pub(crate) struct DispatchShare<F> {
    range: Range<usize>,
    batch: Arc<BatchState<F>>,
}

impl<F> DispatchShare<F>
where
    F: Fn(&JobContext, usize) + Send + Sync + 'static,
{
    pub(crate) fn new(range: Range<usize>, batch: Arc<BatchState<F>>) -> Self {
        Self { range, batch }
    }

    /// Wrap the share as a queueable job
    pub(crate) fn into_job(self) -> Job {
        Job::new(move |ctx| self.run(ctx))
    }

    fn run(self, ctx: &JobContext) {
        // Counts the share as finished even if an item panics.
        let _finish = FinishGuard {
            batch: &self.batch,
            items: self.range.len(),
        };
        for i in self.range.clone() {
            (self.batch.work)(ctx, i);
        }
    }
}

struct FinishGuard<'a, F>
where
    F: Fn(&JobContext, usize) + Send + Sync + 'static,
{
    batch: &'a BatchState<F>,
    items: usize,
}

impl<F> Drop for FinishGuard<'_, F>
where
    F: Fn(&JobContext, usize) + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.batch.finish(self.items);
    }
}
