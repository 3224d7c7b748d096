//! Basic jobsys example
//!
//! Submits a few single jobs and one batch, then waits for them.
//!
//! # Environment Variables
//!
//! - `RUST_LOG=debug` - Log level (error, warn, info, debug, trace)
//! - `JOBSYS_*` - Scheduler overrides, see `SchedulerConfig::from_env`

use jobsys::{run_with, JobId, JobLatch, SchedResult, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// RUST_LOG=debug cargo run -p jobsys-basic
fn main() -> SchedResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== jobsys Basic Example ===\n");

    run_with(SchedulerConfig::from_env(), |sched| {
        println!(
            "Workers: {} ({} logical / {} physical cpus)\n",
            sched.worker_count(),
            sched.topology().logical_cpus(),
            sched.topology().physical_cores()
        );

        // Three single jobs, each with a completion callback
        let latch = Arc::new(JobLatch::new(3));
        for i in 1..=3 {
            let l = Arc::clone(&latch);
            let id = sched.submit_one(
                move |ctx| {
                    log::info!("[job {}] running on worker {}", i, ctx.worker_index());
                },
                Some(Box::new(move |id: JobId| {
                    log::info!("[job {}] completed as {}", i, id);
                    l.count_down();
                })),
            )?;
            println!("Submitted job {} (ID={})", i, id);
        }

        // One batch: 100 items spread across the workers
        let items = Arc::new(AtomicUsize::new(0));
        let batch_latch = Arc::new(JobLatch::new(1));
        let it = Arc::clone(&items);
        let bl = Arc::clone(&batch_latch);
        let start = Instant::now();
        let end_id = sched.submit_batch(
            100,
            move |_, _| {
                it.fetch_add(1, Ordering::Relaxed);
            },
            Some(Box::new(move |_: JobId| bl.count_down())),
        )?;
        println!("Submitted batch of 100 items (end ID={})", end_id);

        let timeout = Duration::from_secs(10);
        if !latch.wait_timeout(timeout) || !batch_latch.wait_timeout(timeout) {
            println!("\nTimeout! {} jobs still pending", latch.remaining());
        }

        println!("\nBatch items run: {} in {:?}", items.load(Ordering::Relaxed), start.elapsed());
        for w in sched.worker_stats() {
            println!("  worker {:>2}: cpu {:?}, {} jobs", w.index, w.cpu, w.executed);
        }
        Ok(())
    })?;

    println!("\n=== Example Complete ===");
    Ok(())
}
