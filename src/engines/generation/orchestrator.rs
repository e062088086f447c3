//! Tick-driven generation loop.
//!
//! A driver thread calls [`GenerationOrchestrator::tick`] repeatedly. Each
//! tick either does nothing (work still in flight, paused, shut down) or
//! submits exactly one batch holding one job per tribe for the chosen
//! [`Phase`]. Batches never overlap, so no two running jobs share a tribe.

use crate::config::engine::EngineConfig;
use crate::engines::generation::phase_jobs::{CrossJob, MutatorJob};
use crate::engines::generation::population::Population;
use crate::engines::generation::progress::{EngineSnapshot, Frontend};
use crate::engines::generation::schedule::PhaseSchedule;
use crate::engines::generation::state::{EngineState, Lifecycle};
use crate::engines::generation::strategy::{Cross, SinglePointCross, TwoPointCross};
use crate::engines::generation::timing::{FitnessRate, FrameWindow, RunningTime};
use crate::error::{GenpaintError, Result};
use crate::jobs::{JobList, JobRef, JobSystem};
use crate::types::Phase;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a call to [`GenerationOrchestrator::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outstanding work was drained and the engine is now shut down
    ShutDown,
    /// A previous batch is still running; nothing changed
    Busy,
    /// Paused; the frontend was updated but nothing was submitted
    Paused,
    Submitted(Phase),
    /// No phase matched the current best fitness
    Idle,
}

/// Staging list plus the per-tribe jobs re-submitted every time a phase runs
struct PhaseBatch {
    list: JobList,
    jobs: Vec<JobRef>,
}

impl PhaseBatch {
    fn new(job_system: &Arc<JobSystem>, jobs: Vec<JobRef>) -> Self {
        Self {
            list: JobList::new(Arc::clone(job_system)),
            jobs,
        }
    }

    fn submit(&mut self, priority: i32) -> Result<()> {
        for job in &self.jobs {
            self.list.add(Arc::clone(job), priority);
        }
        self.list.submit_jobs()
    }
}

struct PhaseLists {
    job_system: Arc<JobSystem>,
    mutate: PhaseBatch,
    two_point: PhaseBatch,
    single_point: PhaseBatch,
}

impl PhaseLists {
    fn batches(&self) -> [&PhaseBatch; 3] {
        [&self.mutate, &self.two_point, &self.single_point]
    }

    fn contains_active_jobs(&self) -> bool {
        self.batches().iter().any(|batch| batch.list.contains_active_jobs())
    }

    fn wait_for_completion(&self) {
        for batch in self.batches() {
            batch.list.wait_for_completion();
        }
    }

    fn batch_mut(&mut self, phase: Phase) -> Option<&mut PhaseBatch> {
        match phase {
            Phase::Mutate => Some(&mut self.mutate),
            Phase::CrossTwoPoint => Some(&mut self.two_point),
            Phase::CrossSinglePoint => Some(&mut self.single_point),
            Phase::Shutdown => None,
        }
    }
}

/// Drives the population through mutate and crossover phases on a
/// [`JobSystem`].
pub struct GenerationOrchestrator {
    config: EngineConfig,
    population: Population,
    frontend: Box<dyn Frontend>,
    state: Arc<EngineState>,
    lists: Option<PhaseLists>,
    schedule: PhaseSchedule,
    phase: Phase,
    updates: u64,
    running_time: RunningTime,
    frames: FrameWindow,
    fitness_rate: FitnessRate,
    last_frame: Instant,
    target_revision: u64,
    tribe_count: usize,
}

impl GenerationOrchestrator {
    pub fn new(config: EngineConfig, population: Population, frontend: Box<dyn Frontend>) -> Self {
        let schedule = PhaseSchedule::new(&config);
        let frames = FrameWindow::new(config.frame_window);
        let target_revision = frontend.target_revision();
        let tribe_count = frontend.tribe_count();
        Self {
            config,
            population,
            frontend,
            state: Arc::new(EngineState::new()),
            lists: None,
            schedule,
            phase: Phase::Mutate,
            updates: 0,
            running_time: RunningTime::new(),
            frames,
            fitness_rate: FitnessRate::new(),
            last_frame: Instant::now(),
            target_revision,
            tribe_count,
        }
    }

    /// Build the starting population and the job system
    pub fn init(&mut self) -> Result<()> {
        if self.state.is_pending_shutdown() {
            return Err(GenpaintError::Usage(
                "Engine is shutting down, cannot initialize".to_string(),
            ));
        }
        match self.state.lifecycle() {
            Lifecycle::Active => return Err(GenpaintError::AlreadyInitialized),
            Lifecycle::Shutdown => return Err(GenpaintError::ShutDown),
            Lifecycle::Uninitialized => {}
        }
        self.generate_starting_state()
    }

    /// Discard the current population and every counter, then seed a fresh
    /// population sized by the frontend's tribe count.
    ///
    /// A tribe count of zero is rejected before anything is torn down. Any
    /// later failure leaves the engine uninitialized so `init` can retry.
    fn generate_starting_state(&mut self) -> Result<()> {
        let tribe_count = self.frontend.tribe_count();
        if tribe_count == 0 {
            return Err(GenpaintError::Usage(format!(
                "Frontend '{}' asked for 0 tribes",
                self.frontend.name()
            )));
        }

        if let Err(e) = self.rebuild(tribe_count) {
            log::error!("Could not build starting state: {}", e);
            self.lists = None;
            self.state.set_lifecycle(Lifecycle::Uninitialized);
            return Err(e);
        }
        Ok(())
    }

    fn rebuild(&mut self, tribe_count: usize) -> Result<()> {
        log::info!(
            "genpaint {} starting: {} tribes of {} genomes, frontend '{}'",
            env!("CARGO_PKG_VERSION"),
            tribe_count,
            self.population.config().genomes_per_tribe,
            self.frontend.name()
        );

        if let Some(lists) = self.lists.take() {
            lists.wait_for_completion();
            lists.job_system.destroy()?;
        }

        self.schedule.reset();
        self.phase = Phase::Mutate;
        self.updates = 0;
        self.running_time = RunningTime::new();
        self.frames = FrameWindow::new(self.config.frame_window);
        self.fitness_rate = FitnessRate::new();
        self.state.reset_counters();
        self.population.registry().clear();

        self.population
            .generate_starting_state(&self.state, tribe_count)?;
        self.state.set_population_count(self.population.genome_count());

        let job_system = Arc::new(JobSystem::new());
        job_system.init(self.config.worker_count.unwrap_or(tribe_count).max(1))?;
        self.lists = Some(self.build_lists(&job_system));

        self.target_revision = self.frontend.target_revision();
        self.tribe_count = tribe_count;
        self.state.set_lifecycle(Lifecycle::Active);
        self.last_frame = Instant::now();
        log::info!(
            "Starting state ready: {} genomes on {} workers",
            self.state.population_count(),
            job_system.worker_count()
        );
        Ok(())
    }

    fn build_lists(&self, job_system: &Arc<JobSystem>) -> PhaseLists {
        let strategies = self.population.strategies();
        let registry = self.population.registry();
        let two_point: Arc<dyn Cross> = Arc::new(TwoPointCross);
        let single_point: Arc<dyn Cross> = Arc::new(SinglePointCross);

        let cross_jobs = |cross: &Arc<dyn Cross>, name: &'static str| -> Vec<JobRef> {
            self.population
                .tribes()
                .iter()
                .map(|tribe| {
                    Arc::new(CrossJob::new(
                        Arc::clone(tribe),
                        Arc::clone(cross),
                        Arc::clone(strategies),
                        Arc::clone(registry),
                        Arc::clone(&self.state),
                        name,
                    )) as JobRef
                })
                .collect()
        };

        let mutate_jobs: Vec<JobRef> = self
            .population
            .tribes()
            .iter()
            .map(|tribe| {
                Arc::new(MutatorJob::new(
                    Arc::clone(tribe),
                    Arc::clone(strategies),
                    Arc::clone(&self.state),
                )) as JobRef
            })
            .collect();

        PhaseLists {
            job_system: Arc::clone(job_system),
            mutate: PhaseBatch::new(job_system, mutate_jobs),
            two_point: PhaseBatch::new(job_system, cross_jobs(&two_point, "cross-two-point")),
            single_point: PhaseBatch::new(
                job_system,
                cross_jobs(&single_point, "cross-single-point"),
            ),
        }
    }

    /// Advance the engine by at most one batch
    pub fn tick(&mut self) -> Result<TickOutcome> {
        match self.state.lifecycle() {
            Lifecycle::Uninitialized => return Err(GenpaintError::NotInitialized),
            Lifecycle::Shutdown => return Err(GenpaintError::ShutDown),
            Lifecycle::Active => {}
        }

        if self.state.is_pending_shutdown() {
            self.shutdown()?;
            return Ok(TickOutcome::ShutDown);
        }

        if self.is_busy() {
            return Ok(TickOutcome::Busy);
        }

        if self.frontend.target_revision() != self.target_revision
            || self.frontend.tribe_count() != self.tribe_count
        {
            log::info!("Target or tribe count changed, regenerating population");
            self.generate_starting_state()?;
        }

        let snapshot = self.snapshot();
        self.frontend.update(&snapshot);

        if self.state.is_paused() {
            // Paused time is not running time
            self.last_frame = Instant::now();
            return Ok(TickOutcome::Paused);
        }

        self.record_frame();

        let best = self.best_fitness().unwrap_or(0.0);
        self.fitness_rate.observe(best);

        let Some(phase) = self.schedule.advance(best) else {
            log::warn!("No phase matches best fitness {}", best);
            return Ok(TickOutcome::Idle);
        };

        let priority = self.config.job_priority;
        let batch = self
            .lists
            .as_mut()
            .and_then(|lists| lists.batch_mut(phase))
            .ok_or(GenpaintError::NotInitialized)?;
        batch.submit(priority)?;

        self.phase = phase;
        self.updates += 1;
        self.state.increment_generation_count();
        log::debug!(
            "Generation {}: submitted {} batch",
            self.state.generation_count(),
            phase
        );
        Ok(TickOutcome::Submitted(phase))
    }

    fn record_frame(&mut self) {
        let now = Instant::now();
        let frame = now.duration_since(self.last_frame);
        self.last_frame = now;

        let state = &self.state;
        self.running_time
            .add_frame(frame, || state.take_generation_snapshot());
        if self.frames.push(frame) {
            log::debug!(
                "Last {} ticks: {:.6} s per tick",
                self.frames.len(),
                self.frames.average_seconds()
            );
        }
    }

    /// Drain outstanding batches and stop the workers. Runs once.
    fn shutdown(&mut self) -> Result<()> {
        log::info!("Shutting down after {} generations", self.state.generation_count());
        if let Some(lists) = self.lists.take() {
            lists.wait_for_completion();
            lists.job_system.destroy()?;
        }
        self.phase = Phase::Shutdown;
        self.state.set_lifecycle(Lifecycle::Shutdown);
        self.state.clear_pending_shutdown();
        Ok(())
    }

    /// Request shutdown; the next tick performs it
    pub fn begin_shutdown(&self) {
        self.state.begin_shutdown();
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.set_paused(paused);
    }

    /// True while any submitted batch has unfinished jobs
    pub fn is_busy(&self) -> bool {
        self.lists
            .as_ref()
            .map(PhaseLists::contains_active_jobs)
            .unwrap_or(false)
    }

    /// Block until every submitted batch has finished
    pub fn wait_for_idle(&self) {
        if let Some(lists) = &self.lists {
            lists.wait_for_completion();
        }
    }

    /// Poll [`is_busy`](Self::is_busy) until it clears or `timeout` passes
    pub fn wait_for_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    pub fn state(&self) -> Arc<EngineState> {
        Arc::clone(&self.state)
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    pub fn mutate_phase_runs(&self) -> u32 {
        self.schedule.mutate_runs()
    }

    pub fn cross_phase_runs(&self) -> u32 {
        self.schedule.cross_runs()
    }

    pub fn generation_count(&self) -> u64 {
        self.state.generation_count()
    }

    /// Batches submitted since the last (re)initialization
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn running_time(&self) -> &RunningTime {
        &self.running_time
    }

    pub fn average_seconds_per_tick(&self) -> f64 {
        self.frames.average_seconds()
    }

    /// Generations per second of running time since the last
    /// (re)initialization. Paused time is not counted.
    pub fn generations_per_second(&self) -> f64 {
        let elapsed = self.running_time.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.state.generation_count() as f64 / elapsed
    }

    pub fn fitness_per_second(&self) -> f64 {
        self.fitness_rate.per_second(self.running_time.total_seconds())
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.population.overall_best().map(|genome| genome.fitness())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            lifecycle: self.state.lifecycle(),
            phase: self.phase,
            paused: self.state.is_paused(),
            pending_shutdown: self.state.is_pending_shutdown(),
            generations: self.state.generation_count(),
            mutations: self.state.mutation_count(),
            crosses: self.state.cross_count(),
            updates: self.updates,
            mutate_phase_runs: self.schedule.mutate_runs(),
            cross_phase_runs: self.schedule.cross_runs(),
            tribes: self.population.tribes().len(),
            population: self.state.population_count(),
            best_fitness: self.best_fitness(),
            hours: self.running_time.hours(),
            minutes: self.running_time.minutes(),
            seconds: self.running_time.seconds(),
            seconds_per_tick: self.frames.average_seconds(),
            generations_last_second: self.running_time.generations_last_second(),
            generations_per_second: self.generations_per_second(),
            fitness_per_second: self.fitness_per_second(),
            taken_at: Utc::now(),
        }
    }
}
