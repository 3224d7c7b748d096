//! Benchmarks for job submission and batch dispatch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobsys_core::{Job, JobQueue};
use jobsys_runtime::{Scheduler, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn bench_queue_push_pop(c: &mut Criterion) {
    c.bench_function("queue_push_pop", |b| {
        let queue = JobQueue::new(1024).unwrap();
        b.iter(|| {
            let id = queue.try_push(Job::new(|_| {})).unwrap();
            black_box(id);
            black_box(queue.pop());
        });
    });
}

fn bench_submit_one(c: &mut Criterion) {
    let sched = Scheduler::init(SchedulerConfig::new().pin_workers(false)).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    c.bench_function("submit_one_1000", |b| {
        b.iter(|| {
            done.store(0, Ordering::Relaxed);
            for _ in 0..1000 {
                let d = Arc::clone(&done);
                sched
                    .submit(move |_| {
                        d.fetch_add(1, Ordering::Relaxed);
                    })
                    .unwrap();
            }
            while done.load(Ordering::Relaxed) < 1000 {
                thread::yield_now();
            }
        });
    });
}

fn bench_submit_batch(c: &mut Criterion) {
    let sched = Scheduler::init(SchedulerConfig::new().pin_workers(false)).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    c.bench_function("submit_batch_100k", |b| {
        b.iter(|| {
            done.store(0, Ordering::Relaxed);
            let d = Arc::clone(&done);
            sched
                .submit_batch(
                    100_000,
                    move |_, i| {
                        black_box(i);
                        d.fetch_add(1, Ordering::Relaxed);
                    },
                    None,
                )
                .unwrap();
            while done.load(Ordering::Relaxed) < 100_000 {
                thread::yield_now();
            }
        });
    });
}

criterion_group!(benches, bench_queue_push_pop, bench_submit_one, bench_submit_batch);
criterion_main!(benches);
