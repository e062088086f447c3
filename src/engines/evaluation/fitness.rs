use crate::engines::evaluation::target::Target;
use crate::engines::generation::strategy::FitnessFunction;
use crate::types::Primitive;
use std::sync::Arc;

/// `1 - mean absolute error` between a genome's parameters and the target.
///
/// Parameters are compared position by position; target positions the
/// genome does not reach count as a full miss, surplus genome parameters
/// are ignored.
pub struct TargetFitness {
    target: Arc<Target>,
}

impl TargetFitness {
    pub fn new(target: Arc<Target>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl FitnessFunction for TargetFitness {
    fn evaluate(&self, primitives: &[Primitive]) -> f64 {
        let expected = self.target.values();
        if expected.is_empty() {
            return 1.0;
        }

        let mut actual = primitives.iter().flatten();
        let error: f64 = expected
            .iter()
            .map(|e| match actual.next() {
                Some(a) => (a - e).abs() as f64,
                None => 1.0,
            })
            .sum();

        (1.0 - error / expected.len() as f64).clamp(0.0, 1.0)
    }
}
