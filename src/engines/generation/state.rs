use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Engine lifecycle: `Uninitialized -> Active -> Shutdown`.
///
/// `Active` may be re-entered from `Active` (re-initialisation); nothing leaves
/// `Shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Uninitialized,
    Active,
    Shutdown,
}

impl Lifecycle {
    fn as_u8(self) -> u8 {
        match self {
            Lifecycle::Uninitialized => 0,
            Lifecycle::Active => 1,
            Lifecycle::Shutdown => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Active,
            2 => Lifecycle::Shutdown,
            _ => Lifecycle::Uninitialized,
        }
    }
}

/// Flags and counters shared between the driver thread, the workers and any
/// observer. Strategies receive it as their engine handle.
#[derive(Debug)]
pub struct EngineState {
    lifecycle: AtomicU8,
    pending_shutdown: AtomicBool,
    paused: AtomicBool,
    generations: AtomicU64,
    generation_snapshot: AtomicU64,
    mutations: AtomicU64,
    crosses: AtomicU64,
    population_count: AtomicUsize,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            lifecycle: AtomicU8::new(Lifecycle::Uninitialized.as_u8()),
            pending_shutdown: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            generations: AtomicU64::new(0),
            generation_snapshot: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
            crosses: AtomicU64::new(0),
            population_count: AtomicUsize::new(0),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle.as_u8(), Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }

    pub fn is_shutdown(&self) -> bool {
        self.lifecycle() == Lifecycle::Shutdown
    }

    /// Ask the orchestrator to drain and stop on its next tick
    pub fn begin_shutdown(&self) {
        self.pending_shutdown.store(true, Ordering::Release);
    }

    pub fn is_pending_shutdown(&self) -> bool {
        self.pending_shutdown.load(Ordering::Acquire)
    }

    pub(crate) fn clear_pending_shutdown(&self) {
        self.pending_shutdown.store(false, Ordering::Release);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn generation_count(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    pub fn increment_generation_count(&self) {
        self.generation_snapshot.fetch_add(1, Ordering::Relaxed);
        self.generations.fetch_add(1, Ordering::Relaxed);
    }

    /// Generations since the last call, resetting the window
    pub(crate) fn take_generation_snapshot(&self) -> u64 {
        self.generation_snapshot.swap(0, Ordering::Relaxed)
    }

    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    pub fn increment_mutation_count(&self) {
        self.mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cross_count(&self) -> u64 {
        self.crosses.load(Ordering::Relaxed)
    }

    pub fn increment_cross_count(&self) {
        self.crosses.fetch_add(1, Ordering::Relaxed);
    }

    /// Sum of genomes across all tribes
    pub fn population_count(&self) -> usize {
        self.population_count.load(Ordering::Relaxed)
    }

    pub fn increment_population_count(&self) {
        self.population_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_population_count(&self) {
        let _ = self
            .population_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub(crate) fn set_population_count(&self, count: usize) {
        self.population_count.store(count, Ordering::Relaxed);
    }

    /// Zero every counter; flags are left alone
    pub(crate) fn reset_counters(&self) {
        self.generations.store(0, Ordering::Relaxed);
        self.generation_snapshot.store(0, Ordering::Relaxed);
        self.mutations.store(0, Ordering::Relaxed);
        self.crosses.store(0, Ordering::Relaxed);
        self.population_count.store(0, Ordering::Relaxed);
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}
