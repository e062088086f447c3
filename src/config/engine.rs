use super::traits::ConfigSection;
use crate::error::GenpaintError;
use serde::{Deserialize, Serialize};

/// Phase schedule and bookkeeping knobs for the generation orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mutate rounds always run before crossover is considered
    pub mutate_phase_threshold: u32,
    /// Best fitness at which crossover rounds start
    pub cross_fitness_ratio: f64,
    /// Leading crossover rounds that use two-point crossover
    pub two_point_rounds: u32,
    /// Crossover rounds before the phase counters reset
    pub cross_rounds_per_cycle: u32,
    /// Ticks averaged for the seconds-per-generation estimate
    pub frame_window: usize,
    /// Priority every phase batch is submitted with
    pub job_priority: i32,
    /// Console progress is logged every this many submitted updates
    pub progress_interval: u64,
    /// Worker threads; defaults to one per tribe
    pub worker_count: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mutate_phase_threshold: 500,
            cross_fitness_ratio: 0.95,
            two_point_rounds: 3,
            cross_rounds_per_cycle: 5,
            frame_window: 100,
            job_priority: 1,
            progress_interval: 1000,
            worker_count: None,
        }
    }
}

impl ConfigSection for EngineConfig {
    fn section_name() -> &'static str {
        "engine"
    }

    fn validate(&self) -> Result<(), GenpaintError> {
        if !(0.0..=1.0).contains(&self.cross_fitness_ratio) {
            return Err(GenpaintError::Configuration(
                "Cross fitness ratio must be between 0 and 1".to_string()
            ));
        }
        if self.cross_rounds_per_cycle == 0 {
            return Err(GenpaintError::Configuration(
                "Cross rounds per cycle must be at least 1".to_string()
            ));
        }
        if self.two_point_rounds > self.cross_rounds_per_cycle {
            return Err(GenpaintError::Configuration(
                "Two-point rounds cannot exceed cross rounds per cycle".to_string()
            ));
        }
        if self.frame_window == 0 {
            return Err(GenpaintError::Configuration(
                "Frame window must hold at least one frame".to_string()
            ));
        }
        if self.worker_count == Some(0) {
            return Err(GenpaintError::Configuration(
                "Worker count must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}
