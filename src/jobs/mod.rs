//! Parallel job execution.
//!
//! - [`Job`]: unit of work, executed once with a worker slot index
//! - [`JobSystem`]: fixed worker pool, priority dispatch, per-batch counters
//! - [`JobList`]: single-owner staging buffer submitted in one shot
//! - [`BatchCounter`]: live count of unfinished jobs in one batch

pub mod counter;
pub mod job;
pub mod list;
pub mod system;

pub use counter::BatchCounter;
pub use job::{job_fn, FnJob, Job, JobRef};
pub use list::{JobList, WaitStatus};
pub use system::JobSystem;
