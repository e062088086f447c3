use serde::{Deserialize, Serialize};
use std::fmt;

/// A single drawable primitive, stored as its raw parameter vector.
///
/// The engine never interprets these values. How many there are and what
/// they mean (vertices, colour channels, alpha) is decided by whoever
/// renders and scores genomes; mutation and crossover only move and swap
/// whole parameters.
pub type Primitive = Vec<f32>;

/// Stable identity of a genome for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomeId(pub u64);

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of work the orchestrator submits on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Mutate,
    CrossTwoPoint,
    CrossSinglePoint,
    Shutdown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Mutate => write!(f, "mutate"),
            Phase::CrossTwoPoint => write!(f, "cross-two-point"),
            Phase::CrossSinglePoint => write!(f, "cross-single-point"),
            Phase::Shutdown => write!(f, "shutdown"),
        }
    }
}
