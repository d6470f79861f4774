#![forbid(unsafe_op_in_unsafe_fn)]
#![deny(missing_docs)]

//! Bind work to one OS thread and dispatch closures onto it from anywhere.
//!
//! Some APIs (GUI toolkits, graphics contexts, OS frameworks) must only be
//! called from the thread that initialized them, usually the main thread. An
//! [`AffineExecutor`] is bound to that thread by calling [`AffineExecutor::run`]
//! on it; any other thread then hands closures over with
//! [`AffineExecutor::submit`] and blocks until they have executed there.
//!
//! Tasks execute strictly one at a time, in the order they reach the conduit.
//! [`AffineExecutor::stop`] closes the conduit; the run-loop drains what is
//! already queued and returns.
//!
//! ```no_run
//! use thread_affine::prelude::*;
//!
//! fn main() -> Result<(), ExecutorError> {
//!     let main_thread = AffineExecutor::new();
//!     let handle = main_thread.clone();
//!     let worker = std::thread::spawn(move || -> Result<(), ExecutorError> {
//!         let on_main = handle.call(|| std::thread::current().name().map(String::from))?;
//!         println!("ran on {on_main:?}");
//!         handle.stop()
//!     });
//!     main_thread.run()?;
//!     worker.join().expect("worker panicked")
//! }
//! ```

mod affinity;
mod error;
mod executor;
/// Thread-level helpers shared by the executor.
pub mod util;

pub use affinity::{PinConfig, pin_current_thread};
pub use error::{ExecutorError, Result};
pub use executor::{AffineExecutor, Builder, ExecutorState};

/// Common imports.
pub mod prelude {
    pub use crate::{AffineExecutor, Builder, ExecutorError, ExecutorState, PinConfig};
    pub use crate::util::in_run_loop;
}
