use genpaint::config::{EngineConfig, PopulationConfig};
use genpaint::engines::generation::{
    ChannelFrontend, EngineSnapshot, FitnessFunction, FrontendControls, GenerationOrchestrator,
    Lifecycle, Population, TickOutcome,
};
use genpaint::types::{Phase, Primitive};
use genpaint::GenpaintError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Scores every genome the same; the score and an artificial delay can be
/// changed while the engine runs.
struct Knob {
    value: AtomicU64,
    delay_ms: AtomicU64,
}

impl Knob {
    fn new(value: f64) -> Arc<Self> {
        Arc::new(Self {
            value: AtomicU64::new(value.to_bits()),
            delay_ms: AtomicU64::new(0),
        })
    }

    fn set_delay(&self, millis: u64) {
        self.delay_ms.store(millis, Ordering::SeqCst);
    }
}

impl FitnessFunction for Knob {
    fn evaluate(&self, _primitives: &[Primitive]) -> f64 {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        f64::from_bits(self.value.load(Ordering::SeqCst))
    }
}

struct Harness {
    engine: GenerationOrchestrator,
    knob: Arc<Knob>,
    controls: FrontendControls,
    snapshots: Receiver<EngineSnapshot>,
}

fn harness(fitness: f64) -> Harness {
    let knob = Knob::new(fitness);
    let config = PopulationConfig {
        tribes: 2,
        genomes_per_tribe: 3,
        primitives_per_genome: 2,
        primitive_len: 2,
        seed: Some(11),
        ..PopulationConfig::default()
    };
    let population = Population::new(config, knob.clone());
    let controls = FrontendControls::new(2);
    let (sender, snapshots) = mpsc::channel();
    let frontend = ChannelFrontend::new(sender, controls.clone());
    let engine = GenerationOrchestrator::new(EngineConfig::default(), population, Box::new(frontend));
    Harness {
        engine,
        knob,
        controls,
        snapshots,
    }
}

fn started(fitness: f64) -> Harness {
    let mut h = harness(fitness);
    h.engine.init().unwrap();
    h
}

/// Tick once the previous batch has drained
fn step(engine: &mut GenerationOrchestrator) -> TickOutcome {
    engine.wait_for_idle();
    engine.tick().unwrap()
}

fn set_best_fitness(engine: &GenerationOrchestrator, fitness: f64) {
    engine.wait_for_idle();
    for tribe in engine.population().tribes() {
        tribe.best().unwrap().set_fitness(fitness);
        tribe.recalculate();
    }
}

#[test]
fn test_tick_before_init_is_an_error() {
    let mut h = harness(0.5);
    assert!(matches!(h.engine.tick(), Err(GenpaintError::NotInitialized)));
}

#[test]
fn test_double_init_is_an_error() {
    let mut h = started(0.5);
    assert!(matches!(h.engine.init(), Err(GenpaintError::AlreadyInitialized)));
}

#[test]
fn test_mutate_phase_holds_below_ratio_then_crosses() {
    let mut h = started(0.5);
    assert_eq!(h.engine.current_phase(), Phase::Mutate);
    assert_eq!(h.engine.mutate_phase_runs(), 0);

    for _ in 0..500 {
        assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
    }
    assert_eq!(h.engine.current_phase(), Phase::Mutate);
    assert_eq!(h.engine.mutate_phase_runs(), 500);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));

    set_best_fitness(&h.engine, 0.95);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::CrossTwoPoint));
    assert_eq!(h.engine.cross_phase_runs(), 1);
}

#[test]
fn test_cross_cycle_runs_two_point_then_single_point_then_resets() {
    let mut h = started(0.5);
    for _ in 0..500 {
        step(&mut h.engine);
    }
    set_best_fitness(&h.engine, 0.97);

    let phases: Vec<TickOutcome> = (0..5).map(|_| step(&mut h.engine)).collect();
    assert_eq!(
        phases,
        vec![
            TickOutcome::Submitted(Phase::CrossTwoPoint),
            TickOutcome::Submitted(Phase::CrossTwoPoint),
            TickOutcome::Submitted(Phase::CrossTwoPoint),
            TickOutcome::Submitted(Phase::CrossSinglePoint),
            TickOutcome::Submitted(Phase::CrossSinglePoint),
        ]
    );
    assert_eq!(h.engine.mutate_phase_runs(), 0);
    assert_eq!(h.engine.cross_phase_runs(), 0);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));

    h.engine.wait_for_idle();
    let state = h.engine.state();
    assert_eq!(state.cross_count(), 5 * 2);
    assert_eq!(state.mutation_count(), 501 * 2);
    // Offspring never beat the knob's constant score, so nothing was replaced
    assert_eq!(state.population_count(), 6);
}

#[test]
fn test_fitness_at_ratio_before_threshold_still_mutates() {
    let mut h = started(0.5);
    set_best_fitness(&h.engine, 0.95);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
    assert_eq!(h.engine.mutate_phase_runs(), 1);
}

#[test]
fn test_nan_fitness_after_threshold_submits_nothing() {
    let mut h = started(0.5);
    for _ in 0..500 {
        step(&mut h.engine);
    }
    set_best_fitness(&h.engine, f64::NAN);

    let generations = h.engine.generation_count();
    assert_eq!(step(&mut h.engine), TickOutcome::Idle);
    assert_eq!(h.engine.generation_count(), generations);
    assert_eq!(h.engine.mutate_phase_runs(), 500);
    assert_eq!(h.engine.cross_phase_runs(), 0);
}

#[test]
fn test_tick_while_busy_changes_nothing() {
    let mut h = started(0.5);
    h.knob.set_delay(200);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));

    let generations = h.engine.generation_count();
    let runs = h.engine.mutate_phase_runs();
    assert!(h.engine.is_busy());
    assert_eq!(h.engine.tick().unwrap(), TickOutcome::Busy);
    assert_eq!(h.engine.generation_count(), generations);
    assert_eq!(h.engine.mutate_phase_runs(), runs);

    h.knob.set_delay(0);
    assert!(h.engine.wait_for_idle_timeout(Duration::from_secs(5)));
    assert_eq!(h.engine.tick().unwrap(), TickOutcome::Submitted(Phase::Mutate));
}

#[test]
fn test_paused_engine_updates_frontend_but_submits_nothing() {
    let mut h = started(0.5);
    h.engine.set_paused(true);

    assert_eq!(step(&mut h.engine), TickOutcome::Paused);
    assert_eq!(h.engine.generation_count(), 0);
    let snapshot = h.snapshots.try_iter().last().unwrap();
    assert!(snapshot.paused);
    assert_eq!(snapshot.tribes, 2);

    h.engine.set_paused(false);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
    assert_eq!(h.engine.generation_count(), 1);
}

#[test]
fn test_shutdown_drains_and_happens_once() {
    let mut h = started(0.5);
    h.knob.set_delay(50);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));

    h.engine.begin_shutdown();
    assert_eq!(h.engine.tick().unwrap(), TickOutcome::ShutDown);

    // Work in flight at shutdown still finished
    let state = h.engine.state();
    assert_eq!(state.mutation_count(), 2);
    assert_eq!(state.lifecycle(), Lifecycle::Shutdown);
    assert!(!state.is_pending_shutdown());
    assert_eq!(h.engine.current_phase(), Phase::Shutdown);

    assert!(matches!(h.engine.tick(), Err(GenpaintError::ShutDown)));
    assert!(matches!(h.engine.init(), Err(GenpaintError::ShutDown)));
}

#[test]
fn test_tribe_count_change_regenerates_population() {
    let mut h = started(0.5);
    for _ in 0..3 {
        step(&mut h.engine);
    }
    assert_eq!(h.engine.generation_count(), 3);

    h.controls.set_tribe_count(3);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
    assert_eq!(h.engine.population().tribes().len(), 3);
    assert_eq!(h.engine.generation_count(), 1);
    assert_eq!(h.engine.mutate_phase_runs(), 1);
    assert_eq!(h.engine.state().population_count(), 9);
}

#[test]
fn test_new_target_resets_counters() {
    let mut h = started(0.5);
    for _ in 0..4 {
        step(&mut h.engine);
    }
    h.controls.bump_revision();
    step(&mut h.engine);
    h.engine.wait_for_idle();

    assert_eq!(h.engine.generation_count(), 1);
    assert_eq!(h.engine.updates(), 1);
    assert_eq!(h.engine.state().mutation_count(), 2);
}

#[test]
fn test_snapshot_serializes() {
    let mut h = started(0.5);
    step(&mut h.engine);
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.best_fitness, Some(0.5));
    assert_eq!(snapshot.lifecycle, Lifecycle::Active);

    let json = serde_json::to_string(&snapshot).unwrap();
    let back: EngineSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.generations, snapshot.generations);
}

#[test]
fn test_zero_tribes_is_rejected_and_engine_keeps_running() {
    let mut h = started(0.5);
    step(&mut h.engine);
    assert_eq!(h.engine.generation_count(), 1);

    h.controls.set_tribe_count(0);
    h.engine.wait_for_idle();
    assert!(matches!(h.engine.tick(), Err(GenpaintError::Usage(_))));
    // Still rejected, not left half torn down
    assert!(matches!(h.engine.tick(), Err(GenpaintError::Usage(_))));
    assert_eq!(h.engine.state().lifecycle(), Lifecycle::Active);
    assert_eq!(h.engine.population().tribes().len(), 2);
    assert_eq!(h.engine.generation_count(), 1);

    // Back to the count in use: the existing population carries on
    h.controls.set_tribe_count(2);
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
    assert_eq!(h.engine.population().tribes().len(), 2);
    assert_eq!(h.engine.generation_count(), 2);
}

#[test]
fn test_init_with_zero_tribes_can_be_retried() {
    let mut h = harness(0.5);
    h.controls.set_tribe_count(0);
    assert!(matches!(h.engine.init(), Err(GenpaintError::Usage(_))));
    assert_eq!(h.engine.state().lifecycle(), Lifecycle::Uninitialized);
    assert!(matches!(h.engine.tick(), Err(GenpaintError::NotInitialized)));

    h.controls.set_tribe_count(2);
    h.engine.init().unwrap();
    assert_eq!(step(&mut h.engine), TickOutcome::Submitted(Phase::Mutate));
}

#[test]
fn test_generation_rate_ignores_paused_time() {
    let mut h = started(0.5);
    for _ in 0..3 {
        thread::sleep(Duration::from_millis(2));
        step(&mut h.engine);
    }
    let rate = h.engine.generations_per_second();
    let running = h.engine.running_time().elapsed();
    assert!(rate > 0.0);

    h.engine.set_paused(true);
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(20));
        assert_eq!(step(&mut h.engine), TickOutcome::Paused);
    }
    assert_eq!(h.engine.generations_per_second(), rate);
    assert_eq!(h.engine.running_time().elapsed(), running);
    assert_eq!(h.snapshots.try_iter().last().unwrap().generations_per_second, rate);

    // The first frame after resuming starts at the last paused tick
    h.engine.set_paused(false);
    step(&mut h.engine);
    assert!(h.engine.running_time().elapsed() - running < Duration::from_millis(100));
}
