/// Thread-local marker for threads currently serving a run-loop.
pub mod bound;

pub use bound::in_run_loop;
