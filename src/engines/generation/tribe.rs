use crate::engines::generation::genome::GenomeRef;
use crate::engines::generation::strategy::Mutator;
use crate::error::{GenpaintError, Result};
use crate::types::GenomeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Member {
    genome: GenomeRef,
    mutator: Option<Arc<dyn Mutator>>,
}

#[derive(Default)]
struct TribeInner {
    members: HashMap<GenomeId, Member>,
    /// Descending by fitness as of insertion or the last recalculate
    ordered: Vec<GenomeRef>,
}

impl TribeInner {
    fn insert_ordered(&mut self, genome: GenomeRef) {
        let fitness = genome.fitness();
        let pos = self
            .ordered
            .partition_point(|member| member.fitness().total_cmp(&fitness).is_ge());
        self.ordered.insert(pos, genome);
    }
}

/// Independently evolving group of genomes with a best-first ordering.
///
/// Membership is by genome identity. The ordered view is exact after
/// [`recalculate`](Tribe::recalculate); fitness changed in place by a
/// mutator is not reflected in it until then.
#[derive(Default)]
pub struct Tribe {
    index: usize,
    inner: RwLock<TribeInner>,
}

impl Tribe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tribe that knows its position inside a population
    pub fn with_index(index: usize) -> Self {
        Self {
            index,
            inner: RwLock::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Add a genome with no mutator. Does nothing if it is already a member.
    pub fn add(&self, genome: GenomeRef) {
        self.insert(genome, None);
    }

    /// Add a genome together with the mutator its population assigned it
    pub fn add_with_mutator(&self, genome: GenomeRef, mutator: Arc<dyn Mutator>) {
        self.insert(genome, Some(mutator));
    }

    fn insert(&self, genome: GenomeRef, mutator: Option<Arc<dyn Mutator>>) {
        let mut inner = self.write();
        if inner.members.contains_key(&genome.id()) {
            return;
        }
        inner.members.insert(
            genome.id(),
            Member {
                genome: Arc::clone(&genome),
                mutator,
            },
        );
        inner.insert_ordered(genome);
    }

    pub fn remove(&self, genome: &GenomeRef) {
        let mut inner = self.write();
        if inner.members.remove(&genome.id()).is_some() {
            inner.ordered.retain(|member| member.id() != genome.id());
        }
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        inner.members.clear();
        inner.ordered.clear();
    }

    pub fn contains(&self, genome: &GenomeRef) -> bool {
        self.read().members.contains_key(&genome.id())
    }

    pub fn size(&self) -> usize {
        self.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().members.is_empty()
    }

    /// Highest-fitness member of the ordered view
    pub fn best(&self) -> Result<GenomeRef> {
        self.read().ordered.first().cloned().ok_or(GenpaintError::EmptyTribe)
    }

    /// Lowest-fitness member of the ordered view
    pub fn worst(&self) -> Result<GenomeRef> {
        self.read().ordered.last().cloned().ok_or(GenpaintError::EmptyTribe)
    }

    /// Snapshot of the ordered view, best first
    pub fn genomes(&self) -> Vec<GenomeRef> {
        self.read().ordered.clone()
    }

    /// Rebuild the ordered view from the member set using current fitness
    pub fn recalculate(&self) {
        let mut inner = self.write();
        let mut scored: Vec<(f64, GenomeRef)> = inner
            .members
            .values()
            .map(|member| (member.genome.fitness(), Arc::clone(&member.genome)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        inner.ordered = scored.into_iter().map(|(_, genome)| genome).collect();
    }

    /// Mutator assigned when the genome was added through its population
    pub fn mutator_for(&self, genome: &GenomeRef) -> Result<Arc<dyn Mutator>> {
        let inner = self.read();
        let member = inner
            .members
            .get(&genome.id())
            .ok_or(GenpaintError::GenomeNotFound(genome.id()))?;
        member
            .mutator
            .clone()
            .ok_or(GenpaintError::Desynchronized {
                tribe: self.index,
                genome: genome.id(),
            })
    }

    /// Members that were added without a mutator
    pub(crate) fn unassigned(&self) -> Vec<GenomeId> {
        self.read()
            .members
            .iter()
            .filter(|(_, member)| member.mutator.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, TribeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TribeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
