//! Genome representation for image evolution
//!
//! A genome is an ordered list of drawable primitives plus the fitness it
//! scored against the target. Draw order matters: later primitives paint
//! over earlier ones, so crossover and mutation keep positions stable.
//!
//! # Identity and in-place mutation
//!
//! Genomes are shared as [`GenomeRef`] (`Arc<Genome>`) between a tribe, the
//! population's mutator table and the genome registry. Equality and hashing
//! use the [`GenomeId`] assigned at construction, never the contents, so a
//! mutator can rewrite primitives and fitness in place without the genome
//! changing identity inside its tribe.
//!
//! Fitness changes made this way are not seen by the tribe's ordering until
//! the tribe is recalculated.

use crate::types::{GenomeId, Primitive};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static NEXT_GENOME_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Default)]
struct GenomeBody {
    primitives: Vec<Primitive>,
    fitness: f64,
}

#[derive(Debug)]
pub struct Genome {
    id: GenomeId,
    body: RwLock<GenomeBody>,
}

pub type GenomeRef = Arc<Genome>;

impl Genome {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self::with_fitness(primitives, 0.0)
    }

    pub fn with_fitness(primitives: Vec<Primitive>, fitness: f64) -> Self {
        Self {
            id: GenomeId(NEXT_GENOME_ID.fetch_add(1, Ordering::Relaxed)),
            body: RwLock::new(GenomeBody { primitives, fitness }),
        }
    }

    pub fn into_ref(self) -> GenomeRef {
        Arc::new(self)
    }

    pub fn id(&self) -> GenomeId {
        self.id
    }

    pub fn fitness(&self) -> f64 {
        self.read().fitness
    }

    pub fn set_fitness(&self, fitness: f64) {
        self.write().fitness = fitness;
    }

    /// Copy of the current primitives
    pub fn primitives(&self) -> Vec<Primitive> {
        self.read().primitives.clone()
    }

    pub fn len(&self) -> usize {
        self.read().primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().primitives.is_empty()
    }

    /// Overwrite contents and fitness in one step
    pub fn replace(&self, primitives: Vec<Primitive>, fitness: f64) {
        let mut body = self.write();
        body.primitives = primitives;
        body.fitness = fitness;
    }

    /// Read primitives without copying them
    pub fn with_primitives<R>(&self, f: impl FnOnce(&[Primitive]) -> R) -> R {
        f(&self.read().primitives)
    }

    fn read(&self) -> RwLockReadGuard<'_, GenomeBody> {
        self.body.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GenomeBody> {
        self.body.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Genome {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Genome {}

impl Hash for Genome {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
