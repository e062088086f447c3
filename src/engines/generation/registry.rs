use crate::engines::generation::genome::{Genome, GenomeRef};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

const PRUNE_INTERVAL: usize = 4096;

#[derive(Default)]
struct RegistryInner {
    genomes: Vec<Weak<Genome>>,
    inserts_since_prune: usize,
}

/// Bookkeeping list of every genome created during a run.
///
/// Shared by all workers, so every access goes through one lock. Entries
/// are weak: genomes dropped from their tribe disappear from
/// [`live`](GenomeRegistry::live) and are pruned periodically.
#[derive(Default)]
pub struct GenomeRegistry {
    inner: Mutex<RegistryInner>,
}

impl GenomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, genome: &GenomeRef) {
        let mut inner = self.lock();
        inner.genomes.push(Arc::downgrade(genome));
        inner.inserts_since_prune += 1;
        if inner.inserts_since_prune >= PRUNE_INTERVAL {
            inner.genomes.retain(|weak| weak.strong_count() > 0);
            inner.inserts_since_prune = 0;
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.genomes.clear();
        inner.inserts_since_prune = 0;
    }

    /// Genomes still alive somewhere
    pub fn live(&self) -> Vec<GenomeRef> {
        self.lock().genomes.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn live_count(&self) -> usize {
        self.lock()
            .genomes
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_genomes_are_not_live() {
        let registry = GenomeRegistry::new();
        let kept = Genome::new(Vec::new()).into_ref();
        registry.add(&kept);
        {
            let dropped = Genome::new(Vec::new()).into_ref();
            registry.add(&dropped);
        }
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.live()[0].id(), kept.id());

        registry.clear();
        assert_eq!(registry.live_count(), 0);
    }
}
