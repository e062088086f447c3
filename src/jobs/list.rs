use crate::error::{GenpaintError, Result};
use crate::jobs::counter::BatchCounter;
use crate::jobs::job::JobRef;
use crate::jobs::system::JobSystem;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a bounded wait on a job list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Completed,
    StillActive,
}

/// Client-side staging of jobs before they reach the [`JobSystem`].
///
/// Jobs are grouped by priority and handed over in one `submit_jobs` call,
/// one batch per non-empty priority. The list is then empty and can be
/// filled again right away.
///
/// A list has a single owner and is not meant to be filled from several
/// threads; give each producer its own list and let the job system deal with
/// the concurrency.
pub struct JobList {
    job_system: Arc<JobSystem>,
    jobs: BTreeMap<i32, Vec<JobRef>>,
    active_counters: Vec<BatchCounter>,
    size: usize,
}

impl JobList {
    pub fn new(job_system: Arc<JobSystem>) -> Self {
        Self {
            job_system,
            jobs: BTreeMap::new(),
            active_counters: Vec::with_capacity(10),
            size: 0,
        }
    }

    pub fn add(&mut self, job: JobRef, priority: i32) {
        self.jobs.entry(priority).or_default().push(job);
        self.size += 1;
    }

    /// Remove a staged job by identity. Does nothing if it is not staged
    /// under `priority`.
    pub fn remove(&mut self, job: &JobRef, priority: i32) {
        let Some(bucket) = self.jobs.get_mut(&priority) else {
            return;
        };
        if let Some(pos) = bucket.iter().position(|staged| Arc::ptr_eq(staged, job)) {
            bucket.remove(pos);
            self.size -= 1;
        }
    }

    /// Jobs staged across all priorities
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Submit every non-empty priority bucket as its own batch and clear the
    /// list. Counters of batches that already drained are dropped here.
    ///
    /// On error, buckets that were not handed over stay staged and `size`
    /// counts exactly those jobs.
    pub fn submit_jobs(&mut self) -> Result<()> {
        self.active_counters.retain(|counter| !counter.is_complete());
        if !self.job_system.is_running() {
            return Err(GenpaintError::NotInitialized);
        }

        for (&priority, bucket) in self.jobs.iter_mut().rev() {
            if bucket.is_empty() {
                continue;
            }
            let counter = self.job_system.submit(bucket.clone(), priority)?;
            self.size -= bucket.len();
            bucket.clear();
            self.active_counters.push(counter);
        }

        self.jobs.clear();
        self.size = 0;
        Ok(())
    }

    /// True while any batch submitted from this list is still running
    pub fn contains_active_jobs(&self) -> bool {
        self.active_counters.iter().any(|counter| !counter.is_complete())
    }

    /// Counters of the batches this list has in flight (or just finished)
    pub fn counters(&self) -> &[BatchCounter] {
        &self.active_counters
    }

    /// Block until every submitted batch has drained
    pub fn wait_for_completion(&self) {
        for counter in &self.active_counters {
            counter.wait();
        }
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion) but gives up
    /// once `timeout` has passed.
    pub fn wait_for_completion_timeout(&self, timeout: Duration) -> WaitStatus {
        let deadline = Instant::now() + timeout;
        for counter in &self.active_counters {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !counter.wait_timeout(remaining) {
                return WaitStatus::StillActive;
            }
        }
        WaitStatus::Completed
    }
}
