//! The thread-affine executor: a run-loop bound to one OS thread, blocking
//! dispatch from any other thread, and explicit shutdown.

mod builder;
mod core;
mod task;

pub use builder::Builder;
pub use self::core::{AffineExecutor, ExecutorState};
