//! Parallel scene collection
//!
//! The pattern a renderer uses each frame: cull a large set of objects in one
//! batch, with every worker appending survivors to its own scratch list
//! (indexed by `JobContext::worker_slot`), then merge the lists on the main
//! thread once the batch completion fires.
//!
//! Usage: `collect [objects] [frames]`

use jobsys::{run_with, JobContext, JobId, JobLatch, SchedResult, SchedulerConfig};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Bounds {
    center: [f32; 3],
    radius: f32,
}

/// Plane as `normal . p + d >= 0` for the inside half-space
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: [f32; 3],
    d: f32,
}

impl Plane {
    fn distance(&self, p: [f32; 3]) -> f32 {
        self.normal[0] * p[0] + self.normal[1] * p[1] + self.normal[2] * p[2] + self.d
    }
}

/// Axis-aligned box of half-extent `h` around the origin, as six planes
fn box_frustum(h: f32) -> [Plane; 6] {
    let axis = |i: usize, sign: f32| {
        let mut normal = [0.0; 3];
        normal[i] = sign;
        Plane { normal, d: h }
    };
    [axis(0, 1.0), axis(0, -1.0), axis(1, 1.0), axis(1, -1.0), axis(2, 1.0), axis(2, -1.0)]
}

fn visible(frustum: &[Plane; 6], b: &Bounds) -> bool {
    frustum.iter().all(|p| p.distance(b.center) >= -b.radius)
}

/// Deterministic scatter so every frame culls the same scene
fn scene(count: usize) -> Arc<[Bounds]> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 40) as f32 / (1u64 << 24) as f32
    };
    (0..count)
        .map(|_| Bounds {
            center: [next() * 200.0 - 100.0, next() * 200.0 - 100.0, next() * 200.0 - 100.0],
            radius: next() * 2.0,
        })
        .collect::<Vec<_>>()
        .into()
}

fn main() -> SchedResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let objects: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(200_000);
    let frames: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);

    println!("=== jobsys Scene Collection ===\n");
    let scene = scene(objects);
    let frustum = box_frustum(50.0);
    let expected = scene.iter().filter(|b| visible(&frustum, b)).count();

    run_with(SchedulerConfig::from_env(), |sched| {
        let workers = sched.worker_count() as usize;
        println!("{} objects, {} frames, {} workers\n", objects, frames, workers);

        // One scratch list per worker; each is only touched by its owner
        let scratch: Arc<[Mutex<Vec<u32>>]> =
            (0..workers).map(|_| Mutex::new(Vec::new())).collect::<Vec<_>>().into();

        for frame in 0..frames {
            for list in scratch.iter() {
                if let Ok(mut l) = list.lock() {
                    l.clear();
                }
            }

            let latch = Arc::new(JobLatch::new(1));
            let l = Arc::clone(&latch);
            let lists = Arc::clone(&scratch);
            let objs = Arc::clone(&scene);
            let start = Instant::now();

            sched.submit_batch(
                objs.len(),
                move |ctx: &JobContext, i: usize| {
                    if visible(&frustum, &objs[i]) {
                        if let Ok(mut list) = lists[ctx.worker_slot()].lock() {
                            list.push(i as u32);
                        }
                    }
                },
                Some(Box::new(move |_: JobId| l.count_down())),
            )?;

            if !latch.wait_timeout(Duration::from_secs(30)) {
                log::error!("frame {} timed out", frame);
                break;
            }

            let mut visible_set: Vec<u32> = Vec::with_capacity(expected);
            for list in scratch.iter() {
                if let Ok(list) = list.lock() {
                    visible_set.extend_from_slice(&list);
                }
            }
            visible_set.sort_unstable();
            println!(
                "frame {:>3}: {:>7} visible in {:?}{}",
                frame,
                visible_set.len(),
                start.elapsed(),
                if visible_set.len() == expected { "" } else { "  MISMATCH" }
            );
        }
        Ok(())
    })?;

    println!("\n=== Collection Complete ===");
    Ok(())
}
