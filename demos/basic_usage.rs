use std::thread;

use thread_affine::prelude::*;

fn main() -> Result<(), ExecutorError> {
    // Dedicated bound thread.
    let (executor, handle) = Builder::new().name("bound").spawn()?;

    executor.submit(|| println!("hello from {:?}", thread::current().name()))?;

    let sum = executor.call(|| (1..=10).sum::<u32>())?;
    println!("sum computed on bound thread: {sum}");

    match executor.submit(|| panic!("task failure")) {
        Err(ExecutorError::TaskPanicked(msg)) => println!("task reported: {msg}"),
        other => println!("unexpected: {other:?}"),
    }

    executor.stop_after_pending()?;
    handle.join().expect("bound thread panicked")?;

    // Stopped executors reject work.
    let err = executor.submit(|| {}).unwrap_err();
    println!("after stop: {err}");
    Ok(())
}
