use crate::engines::generation::state::Lifecycle;
use crate::error::Result;
use crate::types::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Point-in-time view of the engine handed to the frontend every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub paused: bool,
    pub pending_shutdown: bool,
    pub generations: u64,
    pub mutations: u64,
    pub crosses: u64,
    pub updates: u64,
    pub mutate_phase_runs: u32,
    pub cross_phase_runs: u32,
    pub tribes: usize,
    pub population: usize,
    pub best_fitness: Option<f64>,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub seconds_per_tick: f64,
    pub generations_last_second: u64,
    pub generations_per_second: f64,
    pub fitness_per_second: f64,
    pub taken_at: DateTime<Utc>,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Whatever displays the engine and decides what it works on.
///
/// A change in [`target_revision`](Frontend::target_revision) or
/// [`tribe_count`](Frontend::tribe_count) makes the engine regenerate its
/// starting state on the next idle tick.
pub trait Frontend: Send {
    fn name(&self) -> &str;
    fn target_revision(&self) -> u64;
    fn tribe_count(&self) -> usize;
    fn update(&mut self, snapshot: &EngineSnapshot);
}

/// Logs progress every `interval` submitted updates.
pub struct ConsoleFrontend {
    tribes: usize,
    interval: u64,
    last_logged: Option<u64>,
}

impl ConsoleFrontend {
    pub fn new(tribes: usize, interval: u64) -> Self {
        Self {
            tribes,
            interval: interval.max(1),
            last_logged: None,
        }
    }
}

impl Frontend for ConsoleFrontend {
    fn name(&self) -> &str {
        "console"
    }

    fn target_revision(&self) -> u64 {
        0
    }

    fn tribe_count(&self) -> usize {
        self.tribes
    }

    fn update(&mut self, snapshot: &EngineSnapshot) {
        if snapshot.updates % self.interval != 0 || self.last_logged == Some(snapshot.updates) {
            return;
        }
        self.last_logged = Some(snapshot.updates);

        log::info!(
            "Generation {} ({}): best fitness {}, {} mutations, {} crosses, {:02}:{:02}:{:02}, {:.1} gen/s",
            snapshot.generations,
            snapshot.phase,
            snapshot
                .best_fitness
                .map(|f| format!("{:.4}", f))
                .unwrap_or_else(|| "-".to_string()),
            snapshot.mutations,
            snapshot.crosses,
            snapshot.hours,
            snapshot.minutes,
            snapshot.seconds,
            snapshot.generations_per_second,
        );
    }
}

/// Shared knobs a [`ChannelFrontend`] reports to the engine. Cloning shares
/// the same values.
#[derive(Debug, Clone)]
pub struct FrontendControls {
    revision: Arc<AtomicU64>,
    tribes: Arc<AtomicUsize>,
}

impl FrontendControls {
    pub fn new(tribes: usize) -> Self {
        Self {
            revision: Arc::new(AtomicU64::new(0)),
            tribes: Arc::new(AtomicUsize::new(tribes)),
        }
    }

    /// Signal a new target image
    pub fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn set_tribe_count(&self, tribes: usize) {
        self.tribes.store(tribes, Ordering::Release);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn tribe_count(&self) -> usize {
        self.tribes.load(Ordering::Acquire)
    }
}

/// Sends every snapshot over a channel for a UI running on another thread
pub struct ChannelFrontend {
    sender: Sender<EngineSnapshot>,
    controls: FrontendControls,
}

impl ChannelFrontend {
    pub fn new(sender: Sender<EngineSnapshot>, controls: FrontendControls) -> Self {
        Self { sender, controls }
    }
}

impl Frontend for ChannelFrontend {
    fn name(&self) -> &str {
        "channel"
    }

    fn target_revision(&self) -> u64 {
        self.controls.revision()
    }

    fn tribe_count(&self) -> usize {
        self.controls.tribe_count()
    }

    fn update(&mut self, snapshot: &EngineSnapshot) {
        let _ = self.sender.send(snapshot.clone());
    }
}
