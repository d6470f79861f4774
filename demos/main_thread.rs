//! Bind the process main thread and drive it from worker threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use thread_affine::prelude::*;

fn main() -> Result<(), ExecutorError> {
    let main_thread = AffineExecutor::builder().name("main").build();
    let frames = Arc::new(AtomicU64::new(0));
    let iter: u64 = std::env::var("ITER")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000);

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let e = main_thread.clone();
            let frames = frames.clone();
            thread::spawn(move || -> Result<(), ExecutorError> {
                for _ in 0..iter {
                    let frames = frames.clone();
                    e.submit(move || {
                        assert!(in_run_loop());
                        frames.fetch_add(1, Ordering::Relaxed);
                    })?;
                }
                Ok(())
            })
        })
        .collect();

    let controller = {
        let e = main_thread.clone();
        thread::spawn(move || -> Result<(), ExecutorError> {
            for w in workers {
                w.join().expect("worker panicked")?;
            }
            e.stop()
        })
    };

    main_thread.run()?;
    controller.join().expect("controller panicked")?;
    println!("frames on main thread: {}", frames.load(Ordering::Relaxed));
    Ok(())
}
