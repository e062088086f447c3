//! Fixed-size worker pool with priority dispatch.
//!
//! Jobs are submitted in batches. Each batch carries one priority and hands
//! back a [`BatchCounter`] that drains to zero as its jobs finish. Workers
//! always take from the highest non-empty priority first; inside one priority
//! jobs leave in submission order, but they may finish in any order.

use crate::error::{GenpaintError, Result};
use crate::jobs::counter::BatchCounter;
use crate::jobs::job::JobRef;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

struct QueuedJob {
    job: JobRef,
    counter: BatchCounter,
    priority: i32,
}

#[derive(Default)]
struct QueueState {
    buckets: BTreeMap<i32, VecDeque<QueuedJob>>,
    stopping: bool,
}

impl QueueState {
    fn pop_highest(&mut self) -> Option<QueuedJob> {
        let mut entry = self.buckets.last_entry()?;
        let job = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        job
    }
}

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Worker pool executing [`Job`](crate::jobs::Job)s.
///
/// Lifecycle is `new -> init -> (submit)* -> destroy`. `init` may be called
/// again only after `destroy`. All methods take `&self` so one system can be
/// shared by several [`JobList`](crate::jobs::JobList)s.
pub struct JobSystem {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl JobSystem {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(QueueState::default()),
                available: Condvar::new(),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
            workers: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Start `worker_count` worker threads
    pub fn init(&self, worker_count: usize) -> Result<()> {
        self.init_with(worker_count, |slot, shared| {
            thread::Builder::new()
                .name(format!("job-worker-{slot}"))
                .spawn(move || worker_loop(shared, slot))
        })
    }

    /// Start workers through `spawn`. If any spawn fails, the workers started
    /// so far are stopped and joined and the system stays uninitialized.
    fn init_with<S>(&self, worker_count: usize, mut spawn: S) -> Result<()>
    where
        S: FnMut(usize, Arc<Shared>) -> io::Result<JoinHandle<()>>,
    {
        let mut workers = self.lock_workers();
        if self.is_running() {
            return Err(GenpaintError::AlreadyInitialized);
        }
        if worker_count == 0 {
            return Err(GenpaintError::Usage(
                "Job system needs at least one worker".to_string(),
            ));
        }

        self.shared.lock_queue().stopping = false;

        for slot in 0..worker_count {
            match spawn(slot, Arc::clone(&self.shared)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::error!("Failed to spawn worker {}: {}", slot, e);
                    self.shared.lock_queue().stopping = true;
                    self.shared.available.notify_all();
                    for handle in workers.drain(..) {
                        let _ = handle.join();
                    }
                    return Err(e.into());
                }
            }
        }

        self.running.store(true, Ordering::Release);
        log::info!("Job system started with {} workers", worker_count);
        Ok(())
    }

    /// Queue `jobs` as one batch. Never blocks on job execution.
    pub fn submit(&self, jobs: Vec<JobRef>, priority: i32) -> Result<BatchCounter> {
        if !self.is_running() {
            return Err(GenpaintError::NotInitialized);
        }

        let counter = BatchCounter::new(jobs.len());
        if jobs.is_empty() {
            return Ok(counter);
        }

        {
            let mut queue = self.shared.lock_queue();
            // Workers may already be leaving; nothing queued now would run.
            if queue.stopping {
                return Err(GenpaintError::NotInitialized);
            }
            let bucket = queue.buckets.entry(priority).or_default();
            bucket.extend(jobs.into_iter().map(|job| QueuedJob {
                job,
                counter: counter.clone(),
                priority,
            }));
        }
        self.shared.available.notify_all();

        Ok(counter)
    }

    /// Let workers drain everything already queued, then join them
    pub fn destroy(&self) -> Result<()> {
        let mut workers = self.lock_workers();
        if !self.is_running() {
            return Err(GenpaintError::NotInitialized);
        }

        self.running.store(false, Ordering::Release);
        self.shared.lock_queue().stopping = true;
        self.shared.available.notify_all();

        let mut panicked = 0;
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }

        log::info!(
            "Job system stopped ({} jobs completed, {} failed)",
            self.completed_jobs(),
            self.failed_jobs()
        );

        if panicked > 0 {
            return Err(GenpaintError::Usage(format!(
                "{} worker thread(s) panicked",
                panicked
            )));
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.lock_workers().len()
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jobs executed since construction, failed ones included
    pub fn completed_jobs(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Jobs that returned an error or panicked
    pub fn failed_jobs(&self) -> u64 {
        self.shared.failed.load(Ordering::Relaxed)
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.destroy() {
                log::error!("Job system teardown failed: {}", e);
            }
        }
    }
}

fn worker_loop(shared: Arc<Shared>, slot: usize) {
    loop {
        let next = {
            let mut queue = shared.lock_queue();
            loop {
                if let Some(job) = queue.pop_highest() {
                    break Some(job);
                }
                if queue.stopping {
                    break None;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        let Some(queued) = next else {
            log::debug!("Worker {} exiting", slot);
            return;
        };

        run_job(&shared, &queued, slot);
        shared.completed.fetch_add(1, Ordering::Relaxed);
        queued.counter.decrement();
    }
}

fn run_job(shared: &Shared, queued: &QueuedJob, slot: usize) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| queued.job.execute(slot)));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            shared.failed.fetch_add(1, Ordering::Relaxed);
            log::error!(
                "Job '{}' (priority {}) failed on worker {}: {}",
                queued.job.name(),
                queued.priority,
                slot,
                e
            );
        }
        Err(payload) => {
            shared.failed.fetch_add(1, Ordering::Relaxed);
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!(
                "Job '{}' (priority {}) panicked on worker {}: {}",
                queued.job.name(),
                queued.priority,
                slot,
                message
            );
        }
    }
}
