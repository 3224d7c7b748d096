//! Job record, execution context, and lifecycle states

use crate::id::JobId;
use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Job body. Captured state plays the role of the job's arguments and must
/// outlive execution, hence `'static`.
pub type JobFn = Box<dyn FnOnce(&JobContext) + Send + 'static>;

/// Completion callback. Receives only the id of the job that finished.
pub type CompletionFn = Box<dyn FnOnce(JobId) + Send + 'static>;

/// Execution context handed to every job body
///
/// Carries the index of the worker running the job, so bodies can index
/// per-worker scratch storage without a thread-local lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobContext {
    worker: u32,
    job: JobId,
}

impl JobContext {
    #[inline]
    pub const fn new(worker: u32, job: JobId) -> Self {
        Self { worker, job }
    }

    /// Index of the worker executing this job, in `[0, worker_count)`
    #[inline]
    pub const fn worker_index(&self) -> u32 {
        self.worker
    }

    /// Worker index as usize for slice indexing
    #[inline]
    pub const fn worker_slot(&self) -> usize {
        self.worker as usize
    }

    /// Id of the job being executed
    #[inline]
    pub const fn job_id(&self) -> JobId {
        self.job
    }
}

/// Lifecycle of a job
///
/// There is no cancelled or failed state: a queued job either runs to
/// completion or is discarded with the queue at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    /// Sitting in the queue
    Queued = 0,
    /// Popped by a worker, not yet started
    Dispatched = 1,
    /// Body is running
    Executing = 2,
    /// Body returned and completion (if any) has fired
    Completed = 3,
}

impl JobState {
    /// Next state in the lifecycle, `None` once completed
    #[inline]
    pub const fn next(self) -> Option<JobState> {
        match self {
            JobState::Queued => Some(JobState::Dispatched),
            JobState::Dispatched => Some(JobState::Executing),
            JobState::Executing => Some(JobState::Completed),
            JobState::Completed => None,
        }
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Dispatched => "dispatched",
            JobState::Executing => "executing",
            JobState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Result of running one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub id: JobId,
    /// The body panicked; the panic was contained
    pub panicked: bool,
}

/// A unit of work waiting in the queue
///
/// The id is `JobId::NONE` until the queue accepts the job.
pub struct Job {
    id: JobId,
    work: JobFn,
    on_complete: Option<CompletionFn>,
}

impl Job {
    /// Wrap a job body
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce(&JobContext) + Send + 'static,
    {
        Self {
            id: JobId::NONE,
            work: Box::new(work),
            on_complete: None,
        }
    }

    /// Attach an optional completion callback
    pub fn with_completion(mut self, on_complete: Option<CompletionFn>) -> Self {
        self.on_complete = on_complete;
        self
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn has_completion(&self) -> bool {
        self.on_complete.is_some()
    }

    #[inline]
    pub(crate) fn assign_id(&mut self, id: JobId) {
        self.id = id;
    }

    /// Execute the body on `worker`, then fire the completion callback
    ///
    /// Completion fires after the body returns and before the record is
    /// dropped. A panicking body is contained and still counts as finished,
    /// so completion fires in that case too.
    pub fn run(self, worker: u32) -> JobOutcome {
        let Job { id, work, on_complete } = self;
        let ctx = JobContext::new(worker, id);

        log::trace!("job {} {} on worker {}", id, JobState::Executing, worker);
        let body = panic::catch_unwind(AssertUnwindSafe(|| work(&ctx)));
        let mut panicked = false;
        if let Err(payload) = body {
            panicked = true;
            log::error!("job {} panicked on worker {}: {}", id, worker, panic_message(&*payload));
        }

        if let Some(done) = on_complete {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| done(id))) {
                log::error!("completion for job {} panicked: {}", id, panic_message(&*payload));
            }
        }
        log::trace!("job {} {}", id, JobState::Completed);

        JobOutcome { id, panicked }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("has_completion", &self.on_complete.is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
