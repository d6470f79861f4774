mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::{join_within, within};
use thread_affine::prelude::*;

/// Spawn a thread that runs `executor` and reports its own id.
fn bind(executor: &AffineExecutor) -> (thread::ThreadId, thread::JoinHandle<Result<(), ExecutorError>>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let bound = executor.clone();
    let handle = thread::spawn(move || {
        tx.send(thread::current().id()).unwrap();
        bound.run()
    });
    (rx.recv_timeout(common::LIMIT).unwrap(), handle)
}

#[test]
fn end_to_end_submit_runs_on_bound_thread() {
    let _ = env_logger::builder().is_test(true).try_init();
    let executor = AffineExecutor::new();
    let (t1, run_handle) = bind(&executor);

    let counter = Arc::new(AtomicUsize::new(0));
    let recorded = Arc::new(Mutex::new(None));

    let e = executor.clone();
    let (c, r) = (counter.clone(), recorded.clone());
    let t2 = thread::spawn(move || {
        e.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
            *r.lock().unwrap() = Some(thread::current().id());
        })
    });
    join_within("submit from t2", t2).unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(*recorded.lock().unwrap(), Some(t1));
    assert_eq!(executor.bound_thread(), Some(t1));

    executor.stop().unwrap();
    join_within("run loop", run_handle).unwrap();
    assert_eq!(executor.state(), ExecutorState::Stopped);
}

#[test]
fn tasks_from_one_thread_run_in_submission_order() {
    let executor = AffineExecutor::new();
    let (t1, run_handle) = bind(&executor);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (e, s) = (executor.clone(), seen.clone());
    within("ordered submits", move || {
        for i in 0..100 {
            let s = s.clone();
            e.submit(move || s.lock().unwrap().push((i, thread::current().id())))
                .unwrap();
        }
    });

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 100);
    for (expected, (i, id)) in seen.iter().enumerate() {
        assert_eq!(*i, expected);
        assert_eq!(*id, t1);
    }

    executor.stop().unwrap();
    join_within("run loop", run_handle).unwrap();
}

#[test]
fn submit_returns_only_after_task_finished() {
    let executor = AffineExecutor::new();
    let (_, run_handle) = bind(&executor);

    let value = Arc::new(AtomicUsize::new(0));
    let (e, v) = (executor.clone(), value.clone());
    within("slow submit", move || {
        e.submit(move || {
            thread::sleep(Duration::from_millis(50));
            v.store(42, Ordering::SeqCst);
        })
    })
    .unwrap();
    assert_eq!(value.load(Ordering::SeqCst), 42);

    executor.stop().unwrap();
    join_within("run loop", run_handle).unwrap();
}

#[test]
fn call_returns_task_value() {
    let (executor, handle) = AffineExecutor::spawn().unwrap();
    let e = executor.clone();
    let (bound, answer) = within("calls", move || {
        let bound = e.call(|| thread::current().id()).unwrap();
        (bound, e.call(|| 6 * 7).unwrap())
    });
    assert_eq!(executor.bound_thread(), Some(bound));
    assert_eq!(answer, 42);
    executor.stop().unwrap();
    join_within("run loop", handle).unwrap();
}

#[test]
fn task_observes_run_loop_marker() {
    let (executor, handle) = AffineExecutor::spawn().unwrap();
    let e = executor.clone();
    let (marked, own) = within("marker call", move || {
        let inner = e.clone();
        e.call(move || (in_run_loop(), inner.is_bound_thread())).unwrap()
    });
    assert!(marked);
    assert!(own);
    assert!(!in_run_loop());
    assert!(!executor.is_bound_thread());
    executor.stop().unwrap();
    join_within("run loop", handle).unwrap();
}

// Task panics are caught on the bound thread and returned to the submitter.
#[test]
fn panicking_task_is_reported_and_loop_survives() {
    let (executor, handle) = AffineExecutor::spawn().unwrap();

    let e = executor.clone();
    let err = within("panicking submit", move || e.submit(|| panic!("render failed"))).unwrap_err();
    match err {
        ExecutorError::TaskPanicked(msg) => assert_eq!(msg, "render failed"),
        other => panic!("unexpected error: {other}"),
    }

    let e = executor.clone();
    assert_eq!(within("follow-up call", move || e.call(|| 1 + 1)).unwrap(), 2);
    assert_eq!(executor.state(), ExecutorState::Running);

    executor.stop().unwrap();
    join_within("run loop", handle).unwrap();
}

#[test]
fn rendezvous_capacity_preserves_order() {
    let (executor, handle) = Builder::new().capacity(0).spawn().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (e, s) = (executor.clone(), seen.clone());
    within("rendezvous submits", move || {
        for i in 0..20 {
            let s = s.clone();
            e.submit(move || s.lock().unwrap().push(i)).unwrap();
        }
    });
    assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    executor.stop().unwrap();
    join_within("run loop", handle).unwrap();
}
