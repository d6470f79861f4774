#![allow(dead_code)]

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound for any blocking step in these tests.
pub const LIMIT: Duration = Duration::from_secs(5);

/// Run `f` on a helper thread, failing the test instead of hanging if it
/// does not finish within [`LIMIT`].
pub fn within<T, F>(what: &str, f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    match rx.recv_timeout(LIMIT) {
        Ok(v) => v,
        Err(RecvTimeoutError::Timeout) => panic!("{what}: timed out, deadlock?"),
        Err(RecvTimeoutError::Disconnected) => panic!("{what}: helper thread panicked"),
    }
}

/// Join `handle`, bounded by [`LIMIT`].
pub fn join_within<T: Send + 'static>(what: &str, handle: JoinHandle<T>) -> T {
    within(what, move || handle.join().expect("joined thread panicked"))
}
