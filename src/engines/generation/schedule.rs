use crate::config::engine::EngineConfig;
use crate::types::Phase;

/// Decides which phase the next batch belongs to.
///
/// Mutation runs while fewer than `mutate_phase_threshold` mutate rounds have
/// been submitted or the best fitness is below `cross_fitness_ratio`.
/// Crossover runs when the best fitness is at or above the ratio. The two
/// checks are independent: a best fitness that compares false against both
/// (NaN) selects nothing.
#[derive(Debug, Clone)]
pub struct PhaseSchedule {
    mutate_threshold: u32,
    cross_ratio: f64,
    two_point_rounds: u32,
    cross_rounds_per_cycle: u32,
    mutate_runs: u32,
    cross_runs: u32,
}

impl PhaseSchedule {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mutate_threshold: config.mutate_phase_threshold,
            cross_ratio: config.cross_fitness_ratio,
            two_point_rounds: config.two_point_rounds,
            cross_rounds_per_cycle: config.cross_rounds_per_cycle.max(1),
            mutate_runs: 0,
            cross_runs: 0,
        }
    }

    /// Pick the phase for `best` and advance the run counters as if its
    /// batch had been submitted.
    pub fn advance(&mut self, best: f64) -> Option<Phase> {
        if self.mutate_runs < self.mutate_threshold || best < self.cross_ratio {
            self.mutate_runs = self.mutate_runs.saturating_add(1);
            return Some(Phase::Mutate);
        }

        if best >= self.cross_ratio {
            let phase = if self.cross_runs < self.two_point_rounds {
                Phase::CrossTwoPoint
            } else {
                Phase::CrossSinglePoint
            };
            self.cross_runs += 1;
            if self.cross_runs >= self.cross_rounds_per_cycle {
                log::debug!("Crossover cycle finished, phase counters reset");
                self.reset();
            }
            return Some(phase);
        }

        None
    }

    pub fn reset(&mut self) {
        self.mutate_runs = 0;
        self.cross_runs = 0;
    }

    pub fn mutate_runs(&self) -> u32 {
        self.mutate_runs
    }

    pub fn cross_runs(&self) -> u32 {
        self.cross_runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> PhaseSchedule {
        PhaseSchedule::new(&EngineConfig::default())
    }

    #[test]
    fn test_mutate_until_threshold_even_when_fit() {
        let mut schedule = schedule();
        for _ in 0..500 {
            assert_eq!(schedule.advance(0.99), Some(Phase::Mutate));
        }
        assert_eq!(schedule.mutate_runs(), 500);
        assert_eq!(schedule.advance(0.99), Some(Phase::CrossTwoPoint));
    }

    #[test]
    fn test_cross_cycle_then_reset() {
        let mut schedule = schedule();
        for _ in 0..500 {
            schedule.advance(0.5);
        }
        let phases: Vec<_> = (0..5).map(|_| schedule.advance(0.95)).collect();
        assert_eq!(
            phases,
            vec![
                Some(Phase::CrossTwoPoint),
                Some(Phase::CrossTwoPoint),
                Some(Phase::CrossTwoPoint),
                Some(Phase::CrossSinglePoint),
                Some(Phase::CrossSinglePoint),
            ]
        );
        assert_eq!(schedule.mutate_runs(), 0);
        assert_eq!(schedule.cross_runs(), 0);
        assert_eq!(schedule.advance(0.95), Some(Phase::Mutate));
    }

    #[test]
    fn test_low_fitness_falls_back_to_mutate_mid_cycle() {
        let mut schedule = schedule();
        for _ in 0..500 {
            schedule.advance(0.5);
        }
        assert_eq!(schedule.advance(0.96), Some(Phase::CrossTwoPoint));
        assert_eq!(schedule.advance(0.5), Some(Phase::Mutate));
        assert_eq!(schedule.cross_runs(), 1);
    }

    #[test]
    fn test_nan_fitness_after_threshold_selects_nothing() {
        let mut schedule = schedule();
        for _ in 0..500 {
            schedule.advance(0.5);
        }
        assert_eq!(schedule.advance(f64::NAN), None);
        assert_eq!(schedule.mutate_runs(), 500);
        assert_eq!(schedule.cross_runs(), 0);
    }
}
