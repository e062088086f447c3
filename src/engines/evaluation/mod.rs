pub mod fitness;
pub mod target;

pub use fitness::TargetFitness;
pub use target::Target;
