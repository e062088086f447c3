use super::traits::ConfigSection;
use crate::error::GenpaintError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub tribes: usize,
    pub genomes_per_tribe: usize,
    pub primitives_per_genome: usize,
    /// Parameters per primitive
    pub primitive_len: usize,
    pub mutator: MutatorKind,
    pub cross: CrossKind,
    pub selector: SelectorKind,
    pub tournament_size: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutatorKind {
    HillClimb,
    CrossMutate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossKind {
    SinglePoint,
    TwoPoint,
    Blend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorKind {
    Tournament,
    Roulette,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            tribes: 16,
            genomes_per_tribe: 2000,
            primitives_per_genome: 200,
            primitive_len: 10,
            mutator: MutatorKind::HillClimb,
            cross: CrossKind::Blend,
            selector: SelectorKind::Tournament,
            tournament_size: 3,
            seed: None,
        }
    }
}

impl ConfigSection for PopulationConfig {
    fn section_name() -> &'static str {
        "population"
    }

    fn validate(&self) -> Result<(), GenpaintError> {
        if self.tribes == 0 {
            return Err(GenpaintError::Configuration(
                "Population needs at least one tribe".to_string()
            ));
        }
        if self.genomes_per_tribe == 0 {
            return Err(GenpaintError::Configuration(
                "Tribes need at least one genome".to_string()
            ));
        }
        if self.primitives_per_genome == 0 || self.primitive_len == 0 {
            return Err(GenpaintError::Configuration(
                "Genomes need at least one non-empty primitive".to_string()
            ));
        }
        Ok(())
    }
}
