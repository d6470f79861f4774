use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};

use super::builder::Builder;
use super::task::{Completion, Task};
use crate::affinity::{PinConfig, pin_current_thread};
use crate::error::{ExecutorError, Result};
use crate::util::bound::RunLoopGuard;

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of an [`AffineExecutor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// Constructed; no thread has entered `run` yet.
    Created,
    /// A thread is bound and serving the run-loop.
    Running,
    /// The conduit was closed and drained and `run` has returned. Terminal.
    Stopped,
}

/// Uninhabited: nothing is ever sent on the close channel.
enum Never {}

/// Producer side of the conduit. `stop` takes and drops it.
struct Producer {
    tasks: Sender<Task>,
    // Dropping this disconnects `Shared::closed_rx`, waking every submitter
    // still blocked on a full conduit.
    _closed: Sender<Never>,
}

struct Shared {
    tasks_rx: Receiver<Task>,
    closed_rx: Receiver<Never>,
    // `None` once stopped.
    producer: Mutex<Option<Producer>>,
    bound: OnceLock<ThreadId>,
    state: AtomicU8,
    name: Option<String>,
    pin: Option<PinConfig>,
}

/// Executes submitted closures, one at a time and in enqueue order, on the
/// single OS thread that called [`run`](Self::run).
///
/// Handles are cheap to clone and may be shared with any number of threads.
/// All clones refer to the same executor.
///
/// ```no_run
/// use thread_affine::AffineExecutor;
///
/// let executor = AffineExecutor::new();
/// let remote = executor.clone();
/// std::thread::spawn(move || {
///     remote.submit(|| println!("on the main thread")).unwrap();
///     remote.stop().unwrap();
/// });
/// // Blocks until stopped.
/// executor.run().unwrap();
/// ```
#[derive(Clone)]
pub struct AffineExecutor {
    shared: Arc<Shared>,
}

impl AffineExecutor {
    /// Create an executor with default settings. No thread is started.
    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Start configuring an executor.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Spawn a dedicated OS thread and bind a default executor to it.
    pub fn spawn() -> Result<(Self, JoinHandle<Result<()>>)> {
        Builder::new().spawn()
    }

    pub(crate) fn from_parts(capacity: usize, name: Option<String>, pin: Option<PinConfig>) -> Self {
        let (tasks, tasks_rx) = crossbeam_channel::bounded(capacity);
        let (closed, closed_rx) = crossbeam_channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                tasks_rx,
                closed_rx,
                producer: Mutex::new(Some(Producer {
                    tasks,
                    _closed: closed,
                })),
                bound: OnceLock::new(),
                state: AtomicU8::new(CREATED),
                name,
                pin,
            }),
        }
    }

    /// Bind the executor to the calling thread and serve tasks until stopped.
    ///
    /// The binding is permanent: once a thread has entered `run`, every task
    /// this executor ever executes runs on that thread, and the executor is
    /// never bound elsewhere, even after `run` returns.
    ///
    /// Returns once [`stop`](Self::stop) has closed the conduit and every task
    /// already enqueued has been executed. A second call, from any thread,
    /// fails with [`ExecutorError::AlreadyRunning`].
    pub fn run(&self) -> Result<()> {
        let me = thread::current().id();
        if self.shared.bound.set(me).is_err() {
            return Err(ExecutorError::AlreadyRunning);
        }
        self.shared.state.store(RUNNING, Ordering::Release);

        if let Some(pin) = &self.shared.pin {
            if let Err(e) = pin_current_thread(pin) {
                log::warn!("{}: failed to pin bound thread ({pin:?}): {e}", self.label());
            }
        }

        let _scope = RunLoopGuard::enter();
        log::debug!("{}: bound to {me:?}", self.label());

        let mut executed: u64 = 0;
        for task in self.shared.tasks_rx.iter() {
            log::trace!("{}: executing task #{executed}", self.label());
            task.run();
            executed += 1;
        }

        self.shared.state.store(STOPPED, Ordering::Release);
        log::debug!("{}: run-loop exited after {executed} task(s)", self.label());
        Ok(())
    }

    /// Execute `task` on the bound thread and block until it has finished.
    ///
    /// May be called before `run`; the call then blocks until a thread starts
    /// serving the executor. There is no timeout.
    ///
    /// Calling `submit` from the bound thread itself (for example from inside
    /// another task) deadlocks: the bound thread would wait on work only it
    /// can perform. This is not detected.
    ///
    /// # Errors
    ///
    /// - [`ExecutorError::Stopped`] if the executor was stopped before the
    ///   task was enqueued, including while this call was waiting for room in
    ///   the conduit. The task is not run.
    /// - [`ExecutorError::TaskPanicked`] if the task body panicked. The
    ///   run-loop keeps serving later tasks.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender()?;
        let (task, done) = Task::new(Box::new(task));
        // Close wins over a ready send: nothing is enqueued once `stop` returned.
        crossbeam_channel::select_biased! {
            recv(self.shared.closed_rx) -> _ => return Err(ExecutorError::Stopped),
            send(sender, task) -> sent => sent.map_err(|_| ExecutorError::Stopped)?,
        }
        // Release our producer handle before waiting so the run-loop can
        // observe the disconnect after `stop`.
        drop(sender);

        match done.recv() {
            Ok(Completion::Done) => Ok(()),
            Ok(Completion::Panicked(msg)) => Err(ExecutorError::TaskPanicked(msg)),
            Err(_) => Err(ExecutorError::Stopped),
        }
    }

    /// Like [`submit`](Self::submit), returning the value computed by `f`.
    pub fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.submit(move || {
            let _ = tx.send(f());
        })?;
        rx.try_recv().map_err(|_| ExecutorError::Stopped)
    }

    /// Close the conduit so the run-loop exits once it has drained.
    ///
    /// Tasks already enqueued still run; nothing is awaited here. Submitters
    /// still waiting for room in the conduit fail with
    /// [`ExecutorError::Stopped`] without running their task. To make sure
    /// everything submitted earlier has completed, use
    /// [`stop_after_pending`](Self::stop_after_pending).
    ///
    /// # Errors
    ///
    /// [`ExecutorError::AlreadyStopped`] if the executor was already stopped.
    pub fn stop(&self) -> Result<()> {
        match self.lock_producer().take() {
            Some(_producer) => {
                log::debug!("{}: conduit closed", self.label());
                Ok(())
            }
            None => Err(ExecutorError::AlreadyStopped),
        }
    }

    /// Enqueue the stop itself as a task, then wait for it.
    ///
    /// Everything this thread submitted before the call has completed when it
    /// returns. Must not be called from the bound thread.
    pub fn stop_after_pending(&self) -> Result<()> {
        let this = self.clone();
        self.call(move || this.stop())?
    }

    /// The thread this executor is bound to, once `run` has been entered.
    pub fn bound_thread(&self) -> Option<ThreadId> {
        self.shared.bound.get().copied()
    }

    /// Whether the calling thread is this executor's bound thread.
    pub fn is_bound_thread(&self) -> bool {
        self.bound_thread() == Some(thread::current().id())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        match self.shared.state.load(Ordering::Acquire) {
            CREATED => ExecutorState::Created,
            RUNNING => ExecutorState::Running,
            _ => ExecutorState::Stopped,
        }
    }

    /// Whether `stop` has been called. The run-loop may still be draining.
    pub fn is_closed(&self) -> bool {
        self.lock_producer().is_none()
    }

    /// The configured executor name, if any.
    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    fn sender(&self) -> Result<Sender<Task>> {
        self.lock_producer()
            .as_ref()
            .map(|p| p.tasks.clone())
            .ok_or(ExecutorError::Stopped)
    }

    fn lock_producer(&self) -> MutexGuard<'_, Option<Producer>> {
        // The guarded section never panics; recover rather than propagate poison.
        self.shared.producer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("affine-executor")
    }
}

impl Default for AffineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AffineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffineExecutor")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("bound", &self.bound_thread())
            .field("closed", &self.is_closed())
            .finish()
    }
}
