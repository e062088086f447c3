use genpaint::jobs::{job_fn, BatchCounter, JobList, JobSystem, WaitStatus};
use genpaint::GenpaintError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn started(workers: usize) -> Arc<JobSystem> {
    let system = Arc::new(JobSystem::new());
    system.init(workers).unwrap();
    system
}

#[test]
fn test_job_list_two_priorities_all_run() {
    let system = started(2);
    let ran = Arc::new(AtomicUsize::new(0));
    let mut list = JobList::new(Arc::clone(&system));

    for (i, priority) in [1, 1, 1, 2, 2].into_iter().enumerate() {
        let ran = Arc::clone(&ran);
        list.add(
            job_fn(format!("job-{}", i), move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            priority,
        );
    }
    assert_eq!(list.size(), 5);

    list.submit_jobs().unwrap();
    assert_eq!(list.size(), 0);
    assert!(list.is_empty());
    assert_eq!(list.counters().len(), 2);

    list.wait_for_completion();
    assert_eq!(ran.load(Ordering::SeqCst), 5);
    assert!(list.counters().iter().all(|c| c.get() == 0));
    assert!(!list.contains_active_jobs());

    system.destroy().unwrap();
}

#[test]
fn test_counter_is_monotonic_non_increasing() {
    let system = started(3);
    let jobs = (0..20)
        .map(|_| {
            job_fn("sleepy", |_| {
                thread::sleep(Duration::from_millis(1));
                Ok(())
            })
        })
        .collect();
    let counter = system.submit(jobs, 0).unwrap();

    let mut last = counter.get();
    assert!(last <= 20);
    while !counter.is_complete() {
        let now = counter.get();
        assert!(now <= last);
        last = now;
    }
    assert_eq!(counter.get(), 0);
    system.destroy().unwrap();
}

#[test]
fn test_wait_does_not_return_before_slow_job_finishes() {
    let system = started(2);
    let finished = Arc::new(AtomicUsize::new(0));
    let mut list = JobList::new(Arc::clone(&system));

    let slow_done = Arc::clone(&finished);
    list.add(
        job_fn("slow", move |_| {
            thread::sleep(Duration::from_millis(100));
            slow_done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        1,
    );
    let fast_done = Arc::clone(&finished);
    list.add(
        job_fn("fast", move |_| {
            fast_done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        1,
    );
    list.submit_jobs().unwrap();

    assert_eq!(
        list.wait_for_completion_timeout(Duration::from_millis(5)),
        WaitStatus::StillActive
    );
    list.wait_for_completion();
    assert_eq!(finished.load(Ordering::SeqCst), 2);
    system.destroy().unwrap();
}

#[test]
fn test_higher_priority_runs_first_on_single_worker() {
    let system = started(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    // Keep the only worker busy while the rest is queued
    let gate = system
        .submit(
            vec![job_fn("gate", |_| {
                thread::sleep(Duration::from_millis(50));
                Ok(())
            })],
            0,
        )
        .unwrap();

    let mut counters: Vec<BatchCounter> = Vec::new();
    for priority in [1, 7, 3] {
        let order = Arc::clone(&order);
        counters.push(
            system
                .submit(
                    vec![job_fn("ordered", move |_| {
                        order.lock().unwrap().push(priority);
                        Ok(())
                    })],
                    priority,
                )
                .unwrap(),
        );
    }

    gate.wait();
    for counter in &counters {
        counter.wait();
    }
    assert_eq!(*order.lock().unwrap(), vec![7, 3, 1]);
    system.destroy().unwrap();
}

#[test]
fn test_submit_after_destroy_is_rejected() {
    let system = started(1);
    system.destroy().unwrap();

    let result = system.submit(vec![job_fn("late", |_| Ok(()))], 0);
    assert!(matches!(result, Err(GenpaintError::NotInitialized)));

    let mut list = JobList::new(Arc::clone(&system));
    list.add(job_fn("late", |_| Ok(())), 0);
    assert!(list.submit_jobs().is_err());
}

#[test]
fn test_removed_job_is_not_submitted() {
    let system = started(1);
    let ran = Arc::new(AtomicUsize::new(0));
    let mut list = JobList::new(Arc::clone(&system));

    let counted = Arc::clone(&ran);
    let kept = job_fn("kept", move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let dropped = job_fn("dropped", |_| panic!("removed job ran"));

    list.add(Arc::clone(&kept), 2);
    list.add(Arc::clone(&dropped), 2);
    list.remove(&dropped, 2);
    assert_eq!(list.size(), 1);

    list.submit_jobs().unwrap();
    list.wait_for_completion();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(system.failed_jobs(), 0);
    system.destroy().unwrap();
}

#[test]
fn test_destroy_drains_queued_jobs() {
    let system = started(1);
    let ran = Arc::new(AtomicUsize::new(0));

    let jobs = (0..5)
        .map(|_| {
            let ran = Arc::clone(&ran);
            job_fn("slow", move |_| {
                thread::sleep(Duration::from_millis(10));
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect();
    let counter = system.submit(jobs, 1).unwrap();

    system.destroy().unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 5);
    assert_eq!(counter.get(), 0);
    assert!(counter.is_complete());
    assert_eq!(system.completed_jobs(), 5);
}

#[test]
fn test_submit_retries_after_late_init() {
    let system = Arc::new(JobSystem::new());
    let ran = Arc::new(AtomicUsize::new(0));
    let mut list = JobList::new(Arc::clone(&system));

    for priority in [1, 1, 2] {
        let ran = Arc::clone(&ran);
        list.add(
            job_fn("staged", move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            priority,
        );
    }

    assert!(matches!(list.submit_jobs(), Err(GenpaintError::NotInitialized)));
    assert_eq!(list.size(), 3);

    system.init(1).unwrap();
    list.submit_jobs().unwrap();
    assert_eq!(list.size(), 0);
    list.wait_for_completion();
    assert_eq!(ran.load(Ordering::SeqCst), 3);
    system.destroy().unwrap();
}
