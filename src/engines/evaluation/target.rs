use rand::Rng;
use serde::{Deserialize, Serialize};

/// What genomes are evolved towards.
///
/// Rendering is left to the front end; here the target is the flattened
/// parameter vector a perfect genome would carry, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    values: Vec<f32>,
}

impl Target {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Random target for `primitives` primitives of `primitive_len` parameters
    pub fn random<R: Rng>(primitives: usize, primitive_len: usize, rng: &mut R) -> Self {
        Self::new((0..primitives * primitive_len).map(|_| rng.gen::<f32>()).collect())
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
