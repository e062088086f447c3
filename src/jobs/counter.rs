use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

struct CounterInner {
    remaining: AtomicUsize,
    lock: Mutex<()>,
    drained: Condvar,
}

/// Live completion counter for one submitted batch.
///
/// Starts at the number of jobs in the batch and is decremented exactly once
/// per finished job. It never goes below zero and is never reused for a later
/// batch. Clones share the same count.
#[derive(Clone)]
pub struct BatchCounter {
    inner: Arc<CounterInner>,
}

impl BatchCounter {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                remaining: AtomicUsize::new(count),
                lock: Mutex::new(()),
                drained: Condvar::new(),
            }),
        }
    }

    /// Jobs of the batch not finished yet
    pub fn get(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.get() == 0
    }

    /// Record one finished job. Returns the remaining count.
    pub(crate) fn decrement(&self) -> usize {
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                // Taking the lock orders this notify after any waiter's check.
                let _guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
                self.inner.drained.notify_all();
                0
            }
            Ok(n) => n - 1,
            Err(_) => {
                log::warn!("Batch counter decremented past zero; ignoring");
                0
            }
        }
    }

    /// Block until the batch is fully drained
    pub fn wait(&self) {
        let mut guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.get() > 0 {
            guard = self
                .inner
                .drained
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until drained or the timeout expires. Returns true when drained.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.get() > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .inner
                .drained
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            guard = next;
        }
        true
    }
}

impl std::fmt::Debug for BatchCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCounter")
            .field("remaining", &self.get())
            .finish()
    }
}
