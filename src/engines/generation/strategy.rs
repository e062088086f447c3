//! Pluggable evolution strategies.
//!
//! The engine only ever talks to these traits. Concrete implementations form
//! a closed set picked from configuration (see [`MutatorKind`],
//! [`CrossKind`], [`SelectorKind`]).

use crate::config::population::{CrossKind, MutatorKind, SelectorKind};
use crate::engines::generation::genome::{Genome, GenomeRef};
use crate::engines::generation::operators;
use crate::engines::generation::state::EngineState;
use crate::error::Result;
use crate::types::Primitive;
use std::sync::{Arc, Mutex, PoisonError};

/// Scores a genome against the target. Higher is better, `1.0` is a perfect match.
pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, primitives: &[Primitive]) -> f64;

    /// Evaluate and store the result on the genome
    fn score(&self, genome: &Genome) -> f64 {
        let fitness = genome.with_primitives(|p| self.evaluate(p));
        genome.set_fitness(fitness);
        fitness
    }
}

/// Per-genome hill climber, assigned when the genome joins the population.
pub trait Mutator: Send + Sync {
    /// Try to improve `genome` in place. Contents and fitness are replaced
    /// only by a strictly better candidate; returns whether that happened.
    fn mutate(
        &self,
        genome: &Genome,
        fitness: &dyn FitnessFunction,
        engine: &EngineState,
    ) -> Result<bool>;
}

/// Produces a scored offspring from two parents
pub trait Cross: Send + Sync {
    fn cross(
        &self,
        engine: &EngineState,
        fitness: &dyn FitnessFunction,
        first: &Genome,
        second: &Genome,
    ) -> Genome;
}

/// Picks a parent out of a tribe's ordered members
pub trait Selector: Send + Sync {
    fn select(&self, candidates: &[GenomeRef]) -> Option<GenomeRef>;
}

fn scored(fitness: &dyn FitnessFunction, primitives: Vec<Primitive>) -> Genome {
    let value = fitness.evaluate(&primitives);
    Genome::with_fitness(primitives, value)
}

pub struct SinglePointCross;

impl Cross for SinglePointCross {
    fn cross(
        &self,
        _engine: &EngineState,
        fitness: &dyn FitnessFunction,
        first: &Genome,
        second: &Genome,
    ) -> Genome {
        let a = first.primitives();
        let b = second.primitives();
        let child = operators::single_point_crossover(&a, &b, &mut rand::thread_rng());
        scored(fitness, child)
    }
}

pub struct TwoPointCross;

impl Cross for TwoPointCross {
    fn cross(
        &self,
        _engine: &EngineState,
        fitness: &dyn FitnessFunction,
        first: &Genome,
        second: &Genome,
    ) -> Genome {
        let a = first.primitives();
        let b = second.primitives();
        let child = operators::two_point_crossover(&a, &b, &mut rand::thread_rng());
        scored(fitness, child)
    }
}

/// Uniform crossover followed by light perturbation. Crossing a genome with
/// itself degenerates to pure mutation.
pub struct BlendCross {
    pub mutation_rate: f64,
    pub step: f32,
}

impl Default for BlendCross {
    fn default() -> Self {
        Self {
            mutation_rate: 0.01,
            step: 0.1,
        }
    }
}

impl Cross for BlendCross {
    fn cross(
        &self,
        _engine: &EngineState,
        fitness: &dyn FitnessFunction,
        first: &Genome,
        second: &Genome,
    ) -> Genome {
        let mut rng = rand::thread_rng();
        let a = first.primitives();
        let b = second.primitives();
        let mut child = operators::uniform_crossover(&a, &b, &mut rng);
        operators::perturb(&mut child, self.mutation_rate, self.step, &mut rng);
        // Guarantee at least one change so self-crosses are never no-ops
        operators::perturb_one(&mut child, self.step, &mut rng);
        scored(fitness, child)
    }
}

const MIN_STEP: f32 = 0.005;
const MAX_STEP: f32 = 0.5;

/// Single-parameter hill climber with a step size that grows on success and
/// shrinks on failure.
pub struct HillClimbMutator {
    step: Mutex<f32>,
}

impl HillClimbMutator {
    pub fn new(initial_step: f32) -> Self {
        Self {
            step: Mutex::new(initial_step.clamp(MIN_STEP, MAX_STEP)),
        }
    }

    pub fn step(&self) -> f32 {
        *self.step.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn adapt(&self, improved: bool) {
        let mut step = self.step.lock().unwrap_or_else(PoisonError::into_inner);
        let factor = if improved { 1.5 } else { 0.9 };
        *step = (*step * factor).clamp(MIN_STEP, MAX_STEP);
    }
}

impl Default for HillClimbMutator {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Mutator for HillClimbMutator {
    fn mutate(
        &self,
        genome: &Genome,
        fitness: &dyn FitnessFunction,
        _engine: &EngineState,
    ) -> Result<bool> {
        let mut candidate = genome.primitives();
        operators::perturb_one(&mut candidate, self.step(), &mut rand::thread_rng());

        let candidate_fitness = fitness.evaluate(&candidate);
        let improved = candidate_fitness > genome.fitness();
        if improved {
            genome.replace(candidate, candidate_fitness);
        }
        self.adapt(improved);
        Ok(improved)
    }
}

/// Mutates by crossing the genome with itself through a [`Cross`] strategy
pub struct CrossMutator {
    cross: Arc<dyn Cross>,
}

impl CrossMutator {
    pub fn new(cross: Arc<dyn Cross>) -> Self {
        Self { cross }
    }
}

impl Mutator for CrossMutator {
    fn mutate(
        &self,
        genome: &Genome,
        fitness: &dyn FitnessFunction,
        engine: &EngineState,
    ) -> Result<bool> {
        let offspring = self.cross.cross(engine, fitness, genome, genome);
        if offspring.fitness() > genome.fitness() {
            genome.replace(offspring.primitives(), offspring.fitness());
            return Ok(true);
        }
        Ok(false)
    }
}

pub struct TournamentSelector {
    pub tournament_size: usize,
}

impl Selector for TournamentSelector {
    fn select(&self, candidates: &[GenomeRef]) -> Option<GenomeRef> {
        operators::tournament_selection(candidates, self.tournament_size, &mut rand::thread_rng())
    }
}

pub struct RouletteSelector;

impl Selector for RouletteSelector {
    fn select(&self, candidates: &[GenomeRef]) -> Option<GenomeRef> {
        operators::roulette_selection(candidates, &mut rand::thread_rng())
    }
}

impl CrossKind {
    pub fn build(self) -> Arc<dyn Cross> {
        match self {
            CrossKind::SinglePoint => Arc::new(SinglePointCross),
            CrossKind::TwoPoint => Arc::new(TwoPointCross),
            CrossKind::Blend => Arc::new(BlendCross::default()),
        }
    }
}

impl MutatorKind {
    /// Fresh mutator for one genome. `cross` is the population's shared
    /// cross strategy.
    pub fn build(self, cross: &Arc<dyn Cross>) -> Arc<dyn Mutator> {
        match self {
            MutatorKind::HillClimb => Arc::new(HillClimbMutator::default()),
            MutatorKind::CrossMutate => Arc::new(CrossMutator::new(Arc::clone(cross))),
        }
    }
}

impl SelectorKind {
    pub fn build(self, tournament_size: usize) -> Arc<dyn Selector> {
        match self {
            SelectorKind::Tournament => Arc::new(TournamentSelector {
                tournament_size: tournament_size.max(1),
            }),
            SelectorKind::Roulette => Arc::new(RouletteSelector),
        }
    }
}
