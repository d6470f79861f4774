use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{Receiver, Sender};

/// Type-erased unit of work carried over the task conduit.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome sent back to the submitter once its job has run.
#[derive(Debug)]
pub(crate) enum Completion {
    /// The job returned normally.
    Done,
    /// The job panicked; carries the panic message.
    Panicked(String),
}

/// A job paired with its one-shot completion channel.
///
/// Each submission owns its own reply channel, so a submitter can only ever
/// observe the completion of the job it sent.
pub(crate) struct Task {
    job: Job,
    done: Sender<Completion>,
}

impl Task {
    pub(crate) fn new(job: Job) -> (Self, Receiver<Completion>) {
        let (done, rx) = crossbeam_channel::bounded(1);
        (Self { job, done }, rx)
    }

    /// Run the job to completion on the current thread and signal the submitter.
    ///
    /// A panic inside the job is caught here and reported, so the calling
    /// run-loop keeps serving later tasks.
    pub(crate) fn run(self) {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(self.job)) {
            Ok(()) => Completion::Done,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log::warn!("task panicked on bound thread: {msg}");
                Completion::Panicked(msg)
            }
        };
        // Capacity 1 and a single send: never blocks. The submitter may be gone.
        let _ = self.done.send(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
