use crate::engines::generation::population::Strategies;
use crate::engines::generation::registry::GenomeRegistry;
use crate::engines::generation::state::EngineState;
use crate::engines::generation::strategy::Cross;
use crate::engines::generation::tribe::Tribe;
use crate::error::Result;
use crate::jobs::Job;
use std::sync::Arc;

/// One mutate round on one tribe: the tribe's best genome gets a pass of its
/// own mutator.
pub struct MutatorJob {
    tribe: Arc<Tribe>,
    strategies: Arc<Strategies>,
    engine: Arc<EngineState>,
}

impl MutatorJob {
    pub fn new(tribe: Arc<Tribe>, strategies: Arc<Strategies>, engine: Arc<EngineState>) -> Self {
        Self {
            tribe,
            strategies,
            engine,
        }
    }
}

impl Job for MutatorJob {
    fn execute(&self, _worker_slot: usize) -> Result<()> {
        let best = self.tribe.best()?;
        let mutator = self.tribe.mutator_for(&best)?;
        mutator.mutate(&best, self.strategies.fitness.as_ref(), &self.engine)?;
        self.tribe.recalculate();
        self.engine.increment_mutation_count();
        Ok(())
    }

    fn name(&self) -> &str {
        "mutate"
    }
}

/// One crossover round on one tribe.
///
/// The best genome is crossed with a partner picked by the population's
/// selector. The offspring replaces the worst member only if it scores
/// strictly higher, so tribe size never changes.
pub struct CrossJob {
    tribe: Arc<Tribe>,
    cross: Arc<dyn Cross>,
    strategies: Arc<Strategies>,
    registry: Arc<GenomeRegistry>,
    engine: Arc<EngineState>,
    name: &'static str,
}

impl CrossJob {
    pub fn new(
        tribe: Arc<Tribe>,
        cross: Arc<dyn Cross>,
        strategies: Arc<Strategies>,
        registry: Arc<GenomeRegistry>,
        engine: Arc<EngineState>,
        name: &'static str,
    ) -> Self {
        Self {
            tribe,
            cross,
            strategies,
            registry,
            engine,
            name,
        }
    }
}

impl Job for CrossJob {
    fn execute(&self, _worker_slot: usize) -> Result<()> {
        let members = self.tribe.genomes();
        let best = self.tribe.best()?;
        // A lone genome is crossed with itself
        let partner = match members.get(1..) {
            Some(rest) if !rest.is_empty() => self.strategies.selector.select(rest),
            _ => None,
        }
        .unwrap_or_else(|| Arc::clone(&best));

        let offspring = self
            .cross
            .cross(&self.engine, self.strategies.fitness.as_ref(), &best, &partner)
            .into_ref();

        let worst = self.tribe.worst()?;
        if offspring.fitness() > worst.fitness() {
            self.tribe.remove(&worst);
            self.tribe
                .add_with_mutator(Arc::clone(&offspring), self.strategies.new_mutator());
            self.registry.add(&offspring);
        }

        self.tribe.recalculate();
        self.engine.increment_cross_count();
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}
