use crate::config::population::{MutatorKind, PopulationConfig};
use crate::engines::generation::genome::{Genome, GenomeRef};
use crate::engines::generation::operators::random_primitives;
use crate::engines::generation::registry::GenomeRegistry;
use crate::engines::generation::state::EngineState;
use crate::engines::generation::strategy::{Cross, FitnessFunction, Mutator, Selector};
use crate::engines::generation::tribe::Tribe;
use crate::error::{GenpaintError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;

/// Strategy objects shared by every tribe of a population and by the jobs
/// working on them.
pub struct Strategies {
    pub fitness: Arc<dyn FitnessFunction>,
    pub cross: Arc<dyn Cross>,
    pub selector: Arc<dyn Selector>,
    pub mutator: MutatorKind,
}

impl Strategies {
    pub fn from_config(config: &PopulationConfig, fitness: Arc<dyn FitnessFunction>) -> Self {
        Self {
            fitness,
            cross: config.cross.build(),
            selector: config.selector.build(config.tournament_size),
            mutator: config.mutator,
        }
    }

    /// Fresh mutator for a genome joining the population
    pub fn new_mutator(&self) -> Arc<dyn Mutator> {
        self.mutator.build(&self.cross)
    }
}

/// Owns the tribes, the shared strategies and the per-genome mutator
/// assignment.
pub struct Population {
    config: PopulationConfig,
    tribes: Vec<Arc<Tribe>>,
    strategies: Arc<Strategies>,
    registry: Arc<GenomeRegistry>,
}

impl Population {
    pub fn new(config: PopulationConfig, fitness: Arc<dyn FitnessFunction>) -> Self {
        let strategies = Strategies::from_config(&config, fitness);
        Self::with_strategies(config, strategies, Arc::new(GenomeRegistry::new()))
    }

    pub fn with_strategies(
        config: PopulationConfig,
        strategies: Strategies,
        registry: Arc<GenomeRegistry>,
    ) -> Self {
        Self {
            config,
            tribes: Vec::new(),
            strategies: Arc::new(strategies),
            registry,
        }
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn tribes(&self) -> &[Arc<Tribe>] {
        &self.tribes
    }

    pub fn strategies(&self) -> &Arc<Strategies> {
        &self.strategies
    }

    pub fn fitness_function(&self) -> &Arc<dyn FitnessFunction> {
        &self.strategies.fitness
    }

    pub fn cross_object(&self) -> &Arc<dyn Cross> {
        &self.strategies.cross
    }

    pub fn selector(&self) -> &Arc<dyn Selector> {
        &self.strategies.selector
    }

    pub fn registry(&self) -> &Arc<GenomeRegistry> {
        &self.registry
    }

    /// Add a genome to tribe `tribe`, assigning it a fresh mutator
    pub fn add(&self, tribe: usize, genome: GenomeRef, engine: &EngineState) -> Result<()> {
        let target = self.tribes.get(tribe).ok_or_else(|| {
            GenpaintError::Usage(format!(
                "Tribe {} does not exist ({} tribes)",
                tribe,
                self.tribes.len()
            ))
        })?;
        if target.contains(&genome) {
            return Ok(());
        }
        target.add_with_mutator(Arc::clone(&genome), self.strategies.new_mutator());
        self.registry.add(&genome);
        engine.increment_population_count();
        Ok(())
    }

    /// Look up the mutator assigned when `genome` joined
    pub fn mutator_for_genome(&self, genome: &GenomeRef) -> Result<Arc<dyn Mutator>> {
        for tribe in &self.tribes {
            if tribe.contains(genome) {
                return tribe.mutator_for(genome);
            }
        }
        Err(GenpaintError::GenomeNotFound(genome.id()))
    }

    /// Best genome across all tribes
    pub fn overall_best(&self) -> Option<GenomeRef> {
        self.tribes
            .iter()
            .filter_map(|tribe| tribe.best().ok())
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Genomes across all tribes
    pub fn genome_count(&self) -> usize {
        self.tribes.iter().map(|tribe| tribe.size()).sum()
    }

    /// Fail if any tribe holds a genome that never went through [`add`](Self::add)
    pub fn validate(&self) -> Result<()> {
        for tribe in &self.tribes {
            if let Some(genome) = tribe.unassigned().into_iter().next() {
                return Err(GenpaintError::Desynchronized {
                    tribe: tribe.index(),
                    genome,
                });
            }
        }
        Ok(())
    }

    /// Replace all tribes with `tribe_count` freshly seeded ones
    pub fn generate_starting_state(&mut self, engine: &EngineState, tribe_count: usize) -> Result<()> {
        if tribe_count == 0 {
            return Err(GenpaintError::Usage(
                "Population needs at least one tribe".to_string(),
            ));
        }

        self.tribes = (0..tribe_count).map(|i| Arc::new(Tribe::with_index(i))).collect();

        for tribe in 0..tribe_count {
            for genome in self.seed_genomes(tribe) {
                self.add(tribe, genome, engine)?;
            }
            self.tribes[tribe].recalculate();
            log::debug!("Tribe {} seeded with {} genomes", tribe, self.tribes[tribe].size());
        }

        Ok(())
    }

    /// Random, already scored genomes for one tribe
    fn seed_genomes(&self, tribe: usize) -> Vec<GenomeRef> {
        let count = self.config.genomes_per_tribe;
        let primitives = self.config.primitives_per_genome;
        let primitive_len = self.config.primitive_len;
        let seed = self.config.seed;
        let fitness = &self.strategies.fitness;

        (0..count)
            .into_par_iter()
            .map(|i| {
                let body = match seed {
                    Some(seed) => {
                        let stream = (tribe * count + i) as u64;
                        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(stream));
                        random_primitives(primitives, primitive_len, &mut rng)
                    }
                    None => random_primitives(primitives, primitive_len, &mut rand::thread_rng()),
                };
                let genome = Genome::new(body);
                fitness.score(&genome);
                genome.into_ref()
            })
            .collect()
    }
}
