use crate::error::Result;
use std::sync::Arc;

/// One schedulable unit of work.
///
/// Workers call `execute` with their own slot index (`0..worker_count`).
/// A job that returns an error or panics is logged by the worker and still
/// counts as finished for its batch.
pub trait Job: Send + Sync {
    fn execute(&self, worker_slot: usize) -> Result<()>;

    /// Short label used in failure logs
    fn name(&self) -> &str {
        "job"
    }
}

/// Shared handle to a job. Identity (for `JobList::remove`) is pointer identity.
pub type JobRef = Arc<dyn Job>;

/// Adapter so plain closures can be scheduled without a dedicated type.
pub struct FnJob<F> {
    name: String,
    work: F,
}

impl<F> FnJob<F>
where
    F: Fn(usize) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, work: F) -> Self {
        Self {
            name: name.into(),
            work,
        }
    }
}

impl<F> Job for FnJob<F>
where
    F: Fn(usize) -> Result<()> + Send + Sync,
{
    fn execute(&self, worker_slot: usize) -> Result<()> {
        (self.work)(worker_slot)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure into a shareable job handle
pub fn job_fn<F>(name: impl Into<String>, work: F) -> JobRef
where
    F: Fn(usize) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnJob::new(name, work))
}
