//! Stress test - many producers, small queue
//!
//! Several producer threads hammer a deliberately small queue with single
//! jobs and batches. Every executed job records its id in a lock-free queue;
//! at the end each accepted id must have run exactly once.
//!
//! Usage: `stress [jobs_per_producer] [producers]`

use crossbeam_queue::SegQueue;
use jobsys::{JobId, JobLatch, Scheduler, SchedulerConfig};
use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== jobsys Stress Test ===\n");

    let mut args = std::env::args().skip(1);
    let per_producer: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(50_000);
    let producers: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(4);
    let total = per_producer * producers;

    let config = SchedulerConfig::from_env().queue_capacity(64);
    let sched = match Scheduler::init(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("init failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "{} producers x {} jobs, {} workers, queue {} slots",
        producers,
        per_producer,
        sched.worker_count(),
        sched.config().queue_capacity
    );

    let executed: Arc<SegQueue<JobId>> = Arc::new(SegQueue::new());
    let accepted: Arc<SegQueue<JobId>> = Arc::new(SegQueue::new());
    let latch = Arc::new(JobLatch::new(total));
    let start = Instant::now();

    thread::scope(|scope| {
        for p in 0..producers {
            let (sched, executed, accepted, latch) = (&sched, &executed, &accepted, &latch);
            scope.spawn(move || {
                for i in 0..per_producer {
                    let ex = Arc::clone(executed);
                    let l = Arc::clone(latch);
                    let submitted = sched.submit(move |ctx| {
                        ex.push(ctx.job_id());
                        l.count_down();
                    });
                    match submitted {
                        Ok(id) => accepted.push(id),
                        Err(e) => {
                            log::error!("producer {} stopped at job {}: {}", p, i, e);
                            return;
                        }
                    }
                }
            });
        }
    });
    let submit_time = start.elapsed();

    // A batch on top, to exercise share dispatch under the same load
    let batch_items = Arc::new(SegQueue::new());
    let batch_latch = Arc::new(JobLatch::new(1));
    let (bi, bl) = (Arc::clone(&batch_items), Arc::clone(&batch_latch));
    let batch = sched.submit_batch(
        10_000,
        move |_, i| bi.push(i),
        Some(Box::new(move |_: JobId| bl.count_down())),
    );

    let timeout = Duration::from_secs(60);
    let done = latch.wait_timeout(timeout) && batch.is_ok() && batch_latch.wait_timeout(timeout);
    let total_time = start.elapsed();
    let stats = sched.stats();
    sched.shutdown();

    let mut seen = HashSet::with_capacity(total);
    let mut duplicates = 0usize;
    while let Some(id) = executed.pop() {
        if !seen.insert(id) {
            duplicates += 1;
        }
    }
    let mut missing = 0usize;
    while let Some(id) = accepted.pop() {
        if !seen.contains(&id) {
            missing += 1;
        }
    }
    let mut batch_seen = HashSet::new();
    while let Some(i) = batch_items.pop() {
        batch_seen.insert(i);
    }

    println!("\n=== Results ===");
    println!("Jobs submitted:  {}", stats.submitted);
    println!("Jobs executed:   {}", seen.len());
    println!("Duplicates:      {}", duplicates);
    println!("Missing:         {}", missing);
    println!("Batch items:     {}/10000", batch_seen.len());
    println!("Submit time:     {:?}", submit_time);
    println!("Total time:      {:?}", total_time);
    println!("Throughput:      {:.0} jobs/sec", total as f64 / total_time.as_secs_f64());

    if !done || duplicates > 0 || missing > 0 || batch_seen.len() != 10_000 {
        println!("\n=== Stress Test FAILED ===");
        return ExitCode::FAILURE;
    }
    println!("\n=== Stress Test Complete ===");
    ExitCode::SUCCESS
}
