pub mod traits;
pub mod engine;
pub mod population;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use engine::EngineConfig;
pub use population::{CrossKind, MutatorKind, PopulationConfig, SelectorKind};
pub use traits::ConfigSection;
