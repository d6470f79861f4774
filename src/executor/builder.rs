use std::thread::{self, JoinHandle};

use super::core::AffineExecutor;
use crate::affinity::PinConfig;
use crate::error::Result;

/// Default number of tasks the conduit buffers ahead of the run-loop.
pub const DEFAULT_CAPACITY: usize = 1;

/// Builder for configuring an [`AffineExecutor`].
///
/// None of the settings change ordering or correctness; they only affect
/// naming, buffering and where the bound thread is scheduled.
///
/// ```
/// use thread_affine::{Builder, PinConfig};
///
/// let executor = Builder::new()
///     .name("gl")
///     .capacity(4)
///     .pin(PinConfig::core(0))
///     .build();
/// assert_eq!(executor.name(), Some("gl"));
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    name: Option<String>,
    capacity: usize,
    pin: Option<PinConfig>,
}

impl Builder {
    /// Creates a builder with a single-slot conduit, no name and no pinning.
    pub fn new() -> Self {
        Self {
            name: None,
            capacity: DEFAULT_CAPACITY,
            pin: None,
        }
    }

    /// Names the executor. Used in log lines and as the spawned thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets how many submitted tasks may wait in the conduit.
    ///
    /// `0` makes every hand-off a rendezvous with the run-loop.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Pins the bound thread when `run` starts.
    pub fn pin(mut self, pin: PinConfig) -> Self {
        self.pin = if pin.is_empty() { None } else { Some(pin) };
        self
    }

    /// Builds the executor. No thread is started.
    pub fn build(self) -> AffineExecutor {
        AffineExecutor::from_parts(self.capacity, self.name, self.pin)
    }

    /// Builds the executor and binds it to a newly spawned OS thread.
    ///
    /// The join handle yields the result of `run` once the executor is stopped.
    pub fn spawn(self) -> Result<(AffineExecutor, JoinHandle<Result<()>>)> {
        let thread_name = self.name.clone().unwrap_or_else(|| "affine-executor".to_owned());
        let executor = self.build();
        let bound = executor.clone();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || bound.run())?;
        Ok((executor, handle))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
