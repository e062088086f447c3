use thiserror::Error;

use crate::types::GenomeId;

#[derive(Error, Debug)]
pub enum GenpaintError {
    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Already shut down")]
    ShutDown,

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Genome not found: {0}")]
    GenomeNotFound(GenomeId),

    #[error("Population out of sync: tribe {tribe} holds genome {genome} with no assigned mutator")]
    Desynchronized { tribe: usize, genome: GenomeId },

    #[error("Tribe is empty")]
    EmptyTribe,

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenpaintError>;
