//! Main scheduler implementation
//!
//! Owns the job queue, the wake signal and the worker pool. Producers call
//! `submit_one` / `submit_batch`; workers run `worker_main_loop` until the
//! shutdown flag is raised.

use crate::affinity;
use crate::config::SchedulerConfig;
use crate::dispatch::{BatchState, DispatchShare};
use crate::tls;
use crate::topology::CpuTopology;
use crate::wake::WakeSignal;
use crate::worker::{WorkerPool, WorkerState, WorkerStats};

use jobsys_core::constants::MAX_WORKERS;
use jobsys_core::{BatchPlan, CompletionFn, Job, JobContext, JobId, JobQueue, JobState};
use jobsys_core::{SchedError, SchedResult};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// State shared between the scheduler handle and its workers
struct Shared {
    queue: JobQueue,
    wake: WakeSignal,
    shutdown: AtomicBool,
    workers: Box<[WorkerState]>,
    submitted: AtomicU64,
    executed: AtomicU64,
    discarded: AtomicU64,
}

impl Shared {
    /// Tag stored in worker thread-locals, unique among live schedulers
    #[inline]
    fn owner_token(&self) -> usize {
        self as *const Shared as usize
    }
}

/// Scheduler-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Jobs accepted by the queue (a batch counts one per share)
    pub submitted: u64,
    /// Jobs run to completion, panicked ones included
    pub executed: u64,
    /// Jobs dropped from the queue at shutdown
    pub discarded: u64,
    /// Jobs currently waiting in the queue
    pub queued: usize,
    /// Workers currently parked on the wake signal
    pub parked: usize,
}

/// Job scheduler
///
/// Created once with `init`; the worker count is fixed from then on.
/// Dropping the scheduler shuts it down.
pub struct Scheduler {
    shared: Arc<Shared>,
    pool: Mutex<Option<WorkerPool>>,
    topology: CpuTopology,
    config: SchedulerConfig,
    worker_count: u32,
}

impl Scheduler {
    /// Validate `config`, detect the CPU topology and start the workers
    pub fn init(config: SchedulerConfig) -> SchedResult<Self> {
        Self::with_topology(config, CpuTopology::detect())
    }

    /// Start the scheduler against an explicit topology
    pub fn with_topology(config: SchedulerConfig, topology: CpuTopology) -> SchedResult<Self> {
        config.validate()?;
        config.log();

        let use_logical = config.use_logical_cores;
        let num_workers = config
            .num_workers
            .unwrap_or_else(|| topology.default_worker_count(use_logical))
            .min(MAX_WORKERS);

        let workers: Box<[WorkerState]> = topology
            .placement(num_workers, use_logical)
            .into_iter()
            .enumerate()
            .map(|(i, cpu)| WorkerState::new(i as u32, config.pin_workers.then_some(cpu)))
            .collect();

        let shared = Arc::new(Shared {
            queue: JobQueue::new(config.queue_capacity)?,
            wake: WakeSignal::new(),
            shutdown: AtomicBool::new(false),
            workers,
            submitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });

        let mut pool = WorkerPool::new(num_workers);
        let worker_shared = Arc::clone(&shared);
        let started = pool.start(&config.thread_name_prefix, config.stack_size, move |index| {
            worker_main_loop(&worker_shared, index)
        });
        if let Err(e) = started {
            log::error!("jobsys: {}; stopping {} started workers", e, pool.started());
            shared.shutdown.store(true, Ordering::Release);
            shared.wake.wake_all();
            pool.join();
            return Err(e.into());
        }

        log::info!(
            "jobsys: started {} workers (queue {} slots, stride {}, pinning {})",
            num_workers,
            config.queue_capacity,
            topology.stride(use_logical),
            if config.pin_workers { "on" } else { "off" },
        );

        Ok(Self {
            shared,
            pool: Mutex::new(Some(pool)),
            topology,
            config,
            worker_count: num_workers as u32,
        })
    }

    /// Queue one job and wake one parked worker
    ///
    /// Blocks (yielding) while the queue is full. `on_complete` fires with the
    /// returned id after the body has run.
    pub fn submit_one<F>(&self, work: F, on_complete: Option<CompletionFn>) -> SchedResult<JobId>
    where
        F: FnOnce(&JobContext) + Send + 'static,
    {
        let id = self.push(Job::new(work).with_completion(on_complete))?;
        self.shared.wake.wake_one();
        Ok(id)
    }

    /// `submit_one` without a completion callback
    #[inline]
    pub fn submit<F>(&self, work: F) -> SchedResult<JobId>
    where
        F: FnOnce(&JobContext) + Send + 'static,
    {
        self.submit_one(work, None)
    }

    /// Split `count` items across the workers and queue one job per share
    ///
    /// `work` is called once per item index in `[0, count)`. Returns the id
    /// of the last share queued; `on_complete` fires once, with that id,
    /// after every item has run. An empty batch queues nothing and returns
    /// `JobId::NONE`.
    pub fn submit_batch<F>(
        &self,
        count: usize,
        work: F,
        on_complete: Option<CompletionFn>,
    ) -> SchedResult<JobId>
    where
        F: Fn(&JobContext, usize) + Send + Sync + 'static,
    {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return Err(SchedError::ShutDown);
        }
        let plan = BatchPlan::new(count, self.worker_count as usize);
        if plan.is_empty() {
            return Ok(JobId::NONE);
        }
        log::debug!(
            "batch of {} items in {} shares of {}..={}",
            plan.count(),
            plan.dispatches(),
            plan.share_len(plan.dispatches() - 1),
            plan.share_len(0),
        );

        let batch = BatchState::new(work, count, on_complete);
        let mut end_id = JobId::NONE;
        for range in plan.shares() {
            let share = DispatchShare::new(range, Arc::clone(&batch));
            end_id = self.push(share.into_job())?;
        }
        self.shared.wake.wake_all();
        batch.seal(end_id);
        Ok(end_id)
    }

    /// Batch over a shared slice; `work` receives each element
    pub fn submit_batch_over<T, F>(
        &self,
        items: Arc<[T]>,
        work: F,
        on_complete: Option<CompletionFn>,
    ) -> SchedResult<JobId>
    where
        T: Send + Sync + 'static,
        F: Fn(&JobContext, &T) + Send + Sync + 'static,
    {
        let count = items.len();
        self.submit_batch(count, move |ctx, i| work(ctx, &items[i]), on_complete)
    }

    /// Push with backpressure: yield and retry while the queue is full
    ///
    /// A full queue wakes a worker before yielding; otherwise a batch with
    /// more shares than free slots could wait on workers that are all parked.
    fn push(&self, mut job: Job) -> SchedResult<JobId> {
        loop {
            if self.shared.shutdown.load(Ordering::Acquire) {
                return Err(SchedError::ShutDown);
            }
            match self.shared.queue.try_push(job) {
                Ok(id) => {
                    self.shared.submitted.fetch_add(1, Ordering::Relaxed);
                    log::trace!("job {} {}", id, JobState::Queued);
                    return Ok(id);
                }
                Err(back) => {
                    job = back;
                    self.shared.wake.wake_one();
                    thread::yield_now();
                }
            }
        }
    }

    /// Number of workers, fixed at init
    #[inline]
    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    /// Index of the worker running the calling thread, `NOT_A_WORKER` elsewhere
    #[inline]
    pub fn current_worker_index(&self) -> u32 {
        tls::current_worker_index()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            executed: self.shared.executed.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
            queued: self.shared.queue.len(),
            parked: self.shared.wake.parked_count(),
        }
    }

    pub fn worker_stats(&self) -> Vec<WorkerStats> {
        self.shared.workers.iter().map(WorkerState::snapshot).collect()
    }

    #[inline]
    pub fn topology(&self) -> &CpuTopology {
        &self.topology
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// False once `shutdown` has started
    #[inline]
    pub fn is_running(&self) -> bool {
        !self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Stop the workers and discard whatever is still queued
    ///
    /// Jobs already executing run to completion. Idempotent; a concurrent
    /// second caller returns once the workers have been joined. Called from
    /// inside one of this scheduler's jobs, the workers are signalled but not
    /// joined; the join happens on the next call from another thread or on
    /// drop.
    pub fn shutdown(&self) {
        if !self.shared.shutdown.swap(true, Ordering::AcqRel) {
            let discarded = self.shared.queue.reset();
            self.shared.discarded.fetch_add(discarded as u64, Ordering::Relaxed);
            if discarded > 0 {
                log::debug!("jobsys: discarded {} queued jobs", discarded);
            }
            self.shared.wake.wake_all();
        }

        // Never touch the pool from one of our own workers: another thread
        // may hold it while joining this very worker.
        if tls::is_worker_of(self.shared.owner_token()) {
            log::warn!("jobsys: shutdown called from a worker; deferring join");
            return;
        }

        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pool) = pool.take() {
            let workers = pool.num_workers();
            let panicked = pool.join();
            if panicked > 0 {
                log::error!("jobsys: {} worker threads panicked", panicked);
            }
            let stats = self.stats();
            log::info!(
                "jobsys: stopped {} workers ({} jobs executed, {} discarded)",
                workers,
                stats.executed,
                stats.discarded
            );
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("worker_count", &self.worker_count)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Main worker loop
fn worker_main_loop(shared: &Shared, index: u32) {
    tls::set_worker_index(index, shared.owner_token());
    let state = &shared.workers[index as usize];

    if let Some(cpu) = state.target_cpu() {
        match affinity::pin_current_thread(cpu) {
            Ok(()) => {
                state.set_pinned(true);
                log::debug!("worker {} pinned to cpu {}", index, cpu);
            }
            Err(e) => log::warn!("worker {} running unpinned: {}", index, e),
        }
    }
    log::debug!("worker {} started", index);

    loop {
        // Pop under the wake lock so a producer's notify cannot slip in
        // between the emptiness check and the wait.
        let job = {
            let mut guard = shared.wake.lock();
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    break None;
                }
                if let Some(job) = shared.queue.pop() {
                    log::trace!("job {} {} to worker {}", job.id(), JobState::Dispatched, index);
                    break Some(job);
                }
                state.set_parked(true);
                guard = shared.wake.park(guard);
                state.set_parked(false);
            }
        };

        let Some(job) = job else { break };
        let outcome = job.run(index);
        state.record_job(outcome.panicked);
        shared.executed.fetch_add(1, Ordering::Relaxed);
    }

    log::debug!("worker {} exiting", index);
    tls::clear_worker_index();
}
