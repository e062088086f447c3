pub mod genome;
pub mod operators;
pub mod orchestrator;
pub mod phase_jobs;
pub mod population;
pub mod progress;
pub mod registry;
pub mod schedule;
pub mod state;
pub mod strategy;
pub mod timing;
pub mod tribe;

pub use genome::{Genome, GenomeRef};
pub use orchestrator::{GenerationOrchestrator, TickOutcome};
pub use phase_jobs::{CrossJob, MutatorJob};
pub use population::{Population, Strategies};
pub use progress::{ChannelFrontend, ConsoleFrontend, EngineSnapshot, Frontend, FrontendControls};
pub use registry::GenomeRegistry;
pub use schedule::PhaseSchedule;
pub use state::{EngineState, Lifecycle};
pub use strategy::{
    BlendCross, Cross, CrossMutator, FitnessFunction, HillClimbMutator, Mutator,
    RouletteSelector, Selector, SinglePointCross, TournamentSelector, TwoPointCross,
};
pub use timing::{FitnessRate, FrameWindow, RunningTime};
pub use tribe::Tribe;
