use core::cell::Cell;

thread_local! {
    static RUN_LOOP_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Returns true if the current thread is serving the run-loop of any executor.
///
/// This does not identify which executor; use
/// [`AffineExecutor::is_bound_thread`](crate::AffineExecutor::is_bound_thread)
/// for that. A task body can use this to assert it was dispatched rather than called
/// directly. Submitting to an executor from its own bound thread deadlocks.
pub fn in_run_loop() -> bool {
    RUN_LOOP_DEPTH.with(|c| c.get() > 0)
}

/// Marks the current thread as serving a run-loop until dropped.
pub(crate) struct RunLoopGuard {
    _marker: core::marker::PhantomData<*const ()>,
}

impl RunLoopGuard {
    /// Enter the run-loop scope.
    pub(crate) fn enter() -> Self {
        RUN_LOOP_DEPTH.with(|c| c.set(c.get() + 1));
        Self {
            _marker: core::marker::PhantomData,
        }
    }
}

impl Drop for RunLoopGuard {
    fn drop(&mut self) {
        RUN_LOOP_DEPTH.with(|c| c.set(c.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_marks_and_unmarks() {
        assert!(!in_run_loop());
        {
            let _outer = RunLoopGuard::enter();
            assert!(in_run_loop());
            {
                let _inner = RunLoopGuard::enter();
                assert!(in_run_loop());
            }
            assert!(in_run_loop());
        }
        assert!(!in_run_loop());
    }

    #[test]
    fn marker_is_per_thread() {
        let _guard = RunLoopGuard::enter();
        let other = std::thread::spawn(in_run_loop).join().unwrap();
        assert!(!other);
    }
}
