use crate::engines::generation::genome::GenomeRef;
use crate::types::Primitive;
use rand::Rng;

/// Tournament selection: pick best of K random candidates
pub fn tournament_selection<R: Rng>(
    candidates: &[GenomeRef],
    tournament_size: usize,
    rng: &mut R,
) -> Option<GenomeRef> {
    if candidates.is_empty() {
        return None;
    }

    let mut best_idx = rng.gen_range(0..candidates.len());
    let mut best_fitness = candidates[best_idx].fitness();

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..candidates.len());
        let fitness = candidates[idx].fitness();
        if fitness > best_fitness {
            best_idx = idx;
            best_fitness = fitness;
        }
    }

    Some(candidates[best_idx].clone())
}

/// Roulette wheel selection: probability proportional to fitness
pub fn roulette_selection<R: Rng>(candidates: &[GenomeRef], rng: &mut R) -> Option<GenomeRef> {
    if candidates.is_empty() {
        return None;
    }

    let total_fitness: f64 = candidates.iter().map(|g| g.fitness().max(0.0)).sum();

    if total_fitness <= 0.0 {
        // Nothing scored yet, pick random
        return Some(candidates[rng.gen_range(0..candidates.len())].clone());
    }

    let mut spin = rng.gen::<f64>() * total_fitness;

    for genome in candidates {
        spin -= genome.fitness().max(0.0);
        if spin <= 0.0 {
            return Some(genome.clone());
        }
    }

    // Rounding fallback
    candidates.last().cloned()
}

/// Single-point crossover: head of `first`, tail of `second`
pub fn single_point_crossover<R: Rng>(
    first: &[Primitive],
    second: &[Primitive],
    rng: &mut R,
) -> Vec<Primitive> {
    let len = first.len().min(second.len());
    if len <= 1 {
        return first.to_vec();
    }

    let point = rng.gen_range(1..len);

    let mut child = first[..len].to_vec();
    child[point..].clone_from_slice(&second[point..len]);
    child
}

/// Two-point crossover: `first` outside `[a, b)`, `second` inside
pub fn two_point_crossover<R: Rng>(
    first: &[Primitive],
    second: &[Primitive],
    rng: &mut R,
) -> Vec<Primitive> {
    let len = first.len().min(second.len());
    if len <= 2 {
        return single_point_crossover(first, second, rng);
    }

    let a = rng.gen_range(1..len - 1);
    let b = rng.gen_range(a + 1..len);

    let mut child = first[..len].to_vec();
    child[a..b].clone_from_slice(&second[a..b]);
    child
}

/// Uniform crossover: each primitive from either parent with equal odds
pub fn uniform_crossover<R: Rng>(
    first: &[Primitive],
    second: &[Primitive],
    rng: &mut R,
) -> Vec<Primitive> {
    first
        .iter()
        .zip(second)
        .map(|(a, b)| if rng.gen::<bool>() { a.clone() } else { b.clone() })
        .collect()
}

/// Mutation: nudge parameters by up to `step`, clamped to `[0, 1]`
pub fn perturb<R: Rng>(primitives: &mut [Primitive], mutation_rate: f64, step: f32, rng: &mut R) {
    for value in primitives.iter_mut().flat_map(|p| p.iter_mut()) {
        if rng.gen::<f64>() < mutation_rate {
            *value = (*value + rng.gen_range(-step..=step)).clamp(0.0, 1.0);
        }
    }
}

/// Nudge exactly one parameter of one primitive
pub fn perturb_one<R: Rng>(primitives: &mut [Primitive], step: f32, rng: &mut R) {
    if primitives.is_empty() {
        return;
    }
    let primitive = &mut primitives[rng.gen_range(0..primitives.len())];
    if primitive.is_empty() {
        return;
    }
    let idx = rng.gen_range(0..primitive.len());
    primitive[idx] = (primitive[idx] + rng.gen_range(-step..=step)).clamp(0.0, 1.0);
}

/// Generate random primitives with parameters in `[0, 1)`
pub fn random_primitives<R: Rng>(count: usize, primitive_len: usize, rng: &mut R) -> Vec<Primitive> {
    (0..count)
        .map(|_| (0..primitive_len).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::genome::Genome;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constant(count: usize, value: f32) -> Vec<Primitive> {
        vec![vec![value; 3]; count]
    }

    #[test]
    fn test_two_point_takes_inner_segment() {
        let mut rng = StdRng::seed_from_u64(7);
        let child = two_point_crossover(&constant(10, 0.0), &constant(10, 1.0), &mut rng);

        assert_eq!(child.len(), 10);
        // Head and tail come from the first parent
        assert_eq!(child[0][0], 0.0);
        assert_eq!(child[9][0], 0.0);
        assert!(child.iter().any(|p| p[0] == 1.0));
    }

    #[test]
    fn test_single_point_keeps_head() {
        let mut rng = StdRng::seed_from_u64(3);
        let child = single_point_crossover(&constant(6, 0.0), &constant(6, 1.0), &mut rng);
        assert_eq!(child[0][0], 0.0);
        assert_eq!(child[5][0], 1.0);
    }

    #[test]
    fn test_perturb_stays_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut primitives = constant(20, 0.99);
        perturb(&mut primitives, 1.0, 0.5, &mut rng);
        assert!(primitives.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let mut rng = StdRng::seed_from_u64(5);
        let weak = Genome::with_fitness(Vec::new(), 0.1).into_ref();
        let strong = Genome::with_fitness(Vec::new(), 0.9).into_ref();
        let pool = vec![weak, strong.clone()];

        // With a large tournament the fitter genome is practically certain
        let picked = tournament_selection(&pool, 32, &mut rng).unwrap();
        assert_eq!(picked.id(), strong.id());
    }

    #[test]
    fn test_selection_on_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(tournament_selection(&[], 3, &mut rng).is_none());
        assert!(roulette_selection(&[], &mut rng).is_none());
    }
}
